
use crate::session::UserIdentity;

pub(crate) fn alice() -> UserIdentity {
    UserIdentity {
        token: "t".to_string(),
        username: "alice".to_string(),
        avatar_url: "a.png".to_string(),
    }
}
