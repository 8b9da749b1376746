//! Post types shared across the plancal ecosystem.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PlancalError;

/// The known platforms offered by frontends. Posts may also carry
/// free-text platform names (the "Other" escape hatch), so `Post`
/// stores platforms as plain strings.
pub const PLATFORMS: [&str; 6] = [
    "Instagram",
    "YouTube",
    "LinkedIn",
    "Facebook",
    "Website",
    "Other",
];

/// The fixed highlight palette. The first entry is the "no color" default.
pub const THEME_COLORS: [&str; 7] = [
    "transparent",
    "#fecaca", // red
    "#fed7aa", // orange
    "#fef08a", // yellow
    "#bbf7d0", // green
    "#bfdbfe", // blue
    "#e9d5ff", // purple
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PostType {
    Reel,
    Post,
    Carousel,
    #[serde(rename = "Blog Post")]
    BlogPost,
}

impl PostType {
    pub const ALL: [PostType; 4] = [
        PostType::Reel,
        PostType::Post,
        PostType::Carousel,
        PostType::BlogPost,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PostType::Reel => "Reel",
            PostType::Post => "Post",
            PostType::Carousel => "Carousel",
            PostType::BlogPost => "Blog Post",
        }
    }
}

impl fmt::Display for PostType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for PostType {
    type Err = PlancalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "reel" => Ok(PostType::Reel),
            "post" => Ok(PostType::Post),
            "carousel" => Ok(PostType::Carousel),
            "blog post" => Ok(PostType::BlogPost),
            _ => Err(PlancalError::Validation(format!(
                "Unknown post type '{}'. Expected one of: Reel, Post, Carousel, Blog Post",
                s
            ))),
        }
    }
}

/// Workflow status of a post. New and imported posts without a status
/// default to `Planned`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PostStatus {
    #[default]
    Planned,
    #[serde(rename = "On Approval")]
    OnApproval,
    Scheduled,
    Posted,
    Edited,
}

impl PostStatus {
    pub const ALL: [PostStatus; 5] = [
        PostStatus::Planned,
        PostStatus::OnApproval,
        PostStatus::Scheduled,
        PostStatus::Posted,
        PostStatus::Edited,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PostStatus::Planned => "Planned",
            PostStatus::OnApproval => "On Approval",
            PostStatus::Scheduled => "Scheduled",
            PostStatus::Posted => "Posted",
            PostStatus::Edited => "Edited",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for PostStatus {
    type Err = PlancalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "planned" => Ok(PostStatus::Planned),
            "on approval" => Ok(PostStatus::OnApproval),
            "scheduled" => Ok(PostStatus::Scheduled),
            "posted" => Ok(PostStatus::Posted),
            "edited" => Ok(PostStatus::Edited),
            _ => Err(PlancalError::Validation(format!(
                "Unknown post status '{}'. Expected one of: Planned, On Approval, Scheduled, Posted, Edited",
                s
            ))),
        }
    }
}

/// A highlight color from the theme palette, stored as its CSS value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThemeColor(pub String);

impl Default for ThemeColor {
    fn default() -> Self {
        ThemeColor(THEME_COLORS[0].to_string())
    }
}

impl fmt::Display for ThemeColor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One planned piece of content on a calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub title: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub types: Vec<PostType>,
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub color: ThemeColor,
    #[serde(default)]
    pub status: PostStatus,
}

impl Post {
    pub fn new(title: impl Into<String>) -> Self {
        Post {
            title: title.into(),
            notes: String::new(),
            types: Vec::new(),
            platforms: Vec::new(),
            color: ThemeColor::default(),
            status: PostStatus::default(),
        }
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase().replace(['-', '_'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_defaults_to_planned_when_missing() {
        let post: Post = serde_json::from_str(
            r#"{"title":"Y","notes":"","types":[],"platforms":[],"color":"transparent"}"#,
        )
        .unwrap();
        assert_eq!(post.status, PostStatus::Planned);
    }

    #[test]
    fn status_serializes_with_spaces() {
        let json = serde_json::to_string(&PostStatus::OnApproval).unwrap();
        assert_eq!(json, r#""On Approval""#);
        let json = serde_json::to_string(&PostType::BlogPost).unwrap();
        assert_eq!(json, r#""Blog Post""#);
    }

    #[test]
    fn parse_tolerates_case_and_separators() {
        assert_eq!(
            "on-approval".parse::<PostStatus>().unwrap(),
            PostStatus::OnApproval
        );
        assert_eq!(
            "Blog_Post".parse::<PostType>().unwrap(),
            PostType::BlogPost
        );
        assert!("published".parse::<PostStatus>().is_err());
    }
}
