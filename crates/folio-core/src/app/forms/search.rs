//! Search overlay reducer: keystrokes update the term, the debounce gate
//! bumps the request counter, results replace the current set.

use crate::api::types::Post;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchShow {
    Neither,
    Loading,
    Results,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchState {
    pub term: String,
    pub results: Vec<Post>,
    pub show: SearchShow,
    /// Trigger counter: each increment is one search request.
    pub request_count: u64,
}

impl SearchState {
    pub fn new() -> Self {
        Self {
            term: String::new(),
            results: Vec::new(),
            show: SearchShow::Neither,
            request_count: 0,
        }
    }
}

impl Default for SearchState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchAction {
    TermUpdate(String),
    /// Fired by the debounce gate once the term has been stable.
    RequestSearch,
    ResultsArrived(Vec<Post>),
}

pub fn reduce(state: &mut SearchState, action: SearchAction) {
    match action {
        SearchAction::TermUpdate(term) => {
            state.show = if term.trim().is_empty() {
                SearchShow::Neither
            } else {
                SearchShow::Loading
            };
            state.term = term;
        }
        SearchAction::RequestSearch => {
            if !state.term.trim().is_empty() {
                state.request_count += 1;
            }
        }
        SearchAction::ResultsArrived(results) => {
            state.results = results;
            state.show = SearchShow::Results;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::Author;

    fn post(id: &str) -> Post {
        Post {
            id: id.to_string(),
            title: "t".to_string(),
            body: "b".to_string(),
            created_date: "2024-01-05T00:00:00.000Z".to_string(),
            author: Author {
                username: "alice".to_string(),
                avatar: "a.png".to_string(),
            },
            is_visitor_owner: false,
        }
    }

    #[test]
    fn typing_shows_loading() {
        let mut state = SearchState::new();
        reduce(&mut state, SearchAction::TermUpdate("dogs".to_string()));
        assert_eq!(state.show, SearchShow::Loading);
    }

    #[test]
    fn clearing_the_term_hides_everything() {
        let mut state = SearchState::new();
        reduce(&mut state, SearchAction::TermUpdate("dogs".to_string()));
        reduce(&mut state, SearchAction::TermUpdate("  ".to_string()));
        assert_eq!(state.show, SearchShow::Neither);
    }

    #[test]
    fn request_counter_requires_a_term() {
        let mut state = SearchState::new();
        reduce(&mut state, SearchAction::RequestSearch);
        assert_eq!(state.request_count, 0);

        reduce(&mut state, SearchAction::TermUpdate("dogs".to_string()));
        reduce(&mut state, SearchAction::RequestSearch);
        assert_eq!(state.request_count, 1);
    }

    #[test]
    fn results_replace_and_show() {
        let mut state = SearchState::new();
        reduce(&mut state, SearchAction::TermUpdate("dogs".to_string()));
        reduce(&mut state, SearchAction::RequestSearch);
        reduce(
            &mut state,
            SearchAction::ResultsArrived(vec![post("1"), post("2")]),
        );

        assert_eq!(state.show, SearchShow::Results);
        assert_eq!(state.results.len(), 2);
    }
}
