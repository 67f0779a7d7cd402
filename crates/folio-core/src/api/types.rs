//! Wire types for the blogging backend. Field names mirror the server's
//! JSON; the client renames them to Rust conventions via serde.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub username: String,
    pub avatar: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub body: String,
    #[serde(rename = "createdDate")]
    pub created_date: String,
    pub author: Author,
    #[serde(rename = "isVisitorOwner", default)]
    pub is_visitor_owner: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileCounts {
    #[serde(rename = "postCount")]
    pub post_count: u64,
    #[serde(rename = "followerCount")]
    pub follower_count: u64,
    #[serde(rename = "followingCount")]
    pub following_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(rename = "profileUsername")]
    pub username: String,
    #[serde(rename = "profileAvatar")]
    pub avatar: String,
    #[serde(rename = "isFollowing")]
    pub is_following: bool,
    pub counts: ProfileCounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowerSummary {
    pub username: String,
    pub avatar: String,
}
