//! Collaborator directory.
//!
//! The relay carries a small built-in table of known collaborators: it
//! supplies the chat mention handle for reminders and backfills directory
//! entries the remote system does not expose. On an id collision the remote
//! record wins.

use serde::Serialize;

use crate::openproject::Principal;

#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: u64,
    pub name: String,
    pub login: Option<String>,
    pub email: Option<String>,
}

pub struct DirectoryEntry {
    pub id: u64,
    pub name: &'static str,
    pub login: &'static str,
    pub email: &'static str,
    /// Handle used when mentioning this person in chat.
    pub chat_handle: &'static str,
}

pub const BUILTIN_DIRECTORY: &[DirectoryEntry] = &[
    DirectoryEntry {
        id: 4,
        name: "Alice Reyes",
        login: "alice.reyes",
        email: "alice.reyes@example.com",
        chat_handle: "@alice",
    },
    DirectoryEntry {
        id: 7,
        name: "Bogdan Petrov",
        login: "bogdan.petrov",
        email: "bogdan.petrov@example.com",
        chat_handle: "@bogdan",
    },
    DirectoryEntry {
        id: 11,
        name: "Chen Wei",
        login: "chen.wei",
        email: "chen.wei@example.com",
        chat_handle: "@chen",
    },
    DirectoryEntry {
        id: 15,
        name: "Dana Kovach",
        login: "dana.kovach",
        email: "dana.kovach@example.com",
        chat_handle: "@dana",
    },
    DirectoryEntry {
        id: 21,
        name: "Edgar Lindqvist",
        login: "edgar.lindqvist",
        email: "edgar.lindqvist@example.com",
        chat_handle: "@edgar",
    },
];

/// Merge remote principals with the built-in table. Remote records win on
/// id collision; built-in-only entries are appended.
pub fn merge_users(remote: Vec<Principal>) -> Vec<UserSummary> {
    let mut merged: Vec<UserSummary> = remote
        .into_iter()
        .map(|principal| UserSummary {
            id: principal.id.unwrap_or(0),
            name: principal.name,
            login: principal.login,
            email: principal.email,
        })
        .collect();

    for entry in BUILTIN_DIRECTORY {
        if merged.iter().any(|user| user.id == entry.id) {
            continue;
        }
        merged.push(UserSummary {
            id: entry.id,
            name: entry.name.to_string(),
            login: Some(entry.login.to_string()),
            email: Some(entry.email.to_string()),
        });
    }

    merged
}

/// Chat handle for a display name, matched exactly but case-insensitively.
///
/// Two directory entries sharing a display name are undefined behavior; the
/// scan returns whichever appears first.
pub fn mention_for_name(name: &str) -> Option<&'static str> {
    BUILTIN_DIRECTORY
        .iter()
        .find(|entry| entry.name.eq_ignore_ascii_case(name))
        .map(|entry| entry.chat_handle)
}
