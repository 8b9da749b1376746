//! Colored terminal rendering for plancal types.
//!
//! Extension traits that add owo_colors output to plancal-core types.

use owo_colors::OwoColorize;
use plancal_core::log::LogEntry;
use plancal_core::{Calendar, Post, PostStatus};

pub trait Render {
    fn render(&self) -> String;
}

impl Render for PostStatus {
    fn render(&self) -> String {
        let label = self.label();
        match self {
            PostStatus::Planned => label.blue().to_string(),
            PostStatus::OnApproval => label.yellow().to_string(),
            PostStatus::Scheduled => label.magenta().to_string(),
            PostStatus::Posted => label.green().to_string(),
            PostStatus::Edited => label.cyan().to_string(),
        }
    }
}

impl Render for Post {
    fn render(&self) -> String {
        let mut details = Vec::new();
        if !self.types.is_empty() {
            let types: Vec<_> = self.types.iter().map(|t| t.label()).collect();
            details.push(types.join(", "));
        }
        if !self.platforms.is_empty() {
            details.push(self.platforms.join(", "));
        }

        if details.is_empty() {
            format!("{}  {}", self.title, self.status.render())
        } else {
            format!(
                "{}  {}  {}",
                self.title,
                self.status.render(),
                format!("({})", details.join(" · ")).dimmed()
            )
        }
    }
}

impl Render for Calendar {
    fn render(&self) -> String {
        format!("📅 {}{}", self.name, render_range(self))
    }
}

impl Render for LogEntry {
    fn render(&self) -> String {
        format!(
            "{}  {}  {}",
            self.timestamp.format("%Y-%m-%d %H:%M").to_string().dimmed(),
            self.ip_address,
            self.change_description
        )
    }
}

fn render_range(calendar: &Calendar) -> String {
    match (calendar.start_date, calendar.end_date) {
        (Some(start), Some(end)) => format!(" ({} → {})", start, end),
        (Some(start), None) => format!(" (from {})", start),
        (None, Some(end)) => format!(" (until {})", end),
        (None, None) => String::new(),
    }
}
