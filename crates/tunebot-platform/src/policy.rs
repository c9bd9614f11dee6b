// SPDX-FileCopyrightText: 2026 Tunebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Whether a message should be scanned for links automatically.

use tunebot_core::{ChatKind, MessageContext, SettingsStore};

/// Decides whether link detection runs for `message`.
///
/// Commands always run. Private chats follow the sender's settings; groups
/// and channels follow the chat's settings. A missing record, or a store
/// error, means enabled.
pub async fn auto_link_detect_enabled(store: &dyn SettingsStore, message: &MessageContext) -> bool {
    if message.is_command {
        return true;
    }

    let setting = match message.chat_kind {
        ChatKind::Private => match message.user_id {
            Some(user_id) => store
                .user_settings(user_id)
                .await
                .map(|s| s.map(|s| s.auto_link_detect)),
            None => Ok(None),
        },
        ChatKind::Group | ChatKind::Channel => store
            .group_settings(message.chat_id)
            .await
            .map(|s| s.map(|s| s.auto_link_detect)),
    };

    match setting {
        Ok(enabled) => enabled.unwrap_or(true),
        Err(e) => {
            tracing::warn!(chat_id = message.chat_id, error = %e, "settings lookup failed, assuming auto link detect");
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tunebot_core::{GroupSettings, TunebotError, UserSettings};

    #[derive(Default)]
    struct StubStore {
        users: Mutex<HashMap<i64, UserSettings>>,
        groups: Mutex<HashMap<i64, GroupSettings>>,
        fail: bool,
    }

    #[async_trait]
    impl SettingsStore for StubStore {
        async fn user_settings(&self, user_id: i64) -> Result<Option<UserSettings>, TunebotError> {
            if self.fail {
                return Err(TunebotError::Internal("db down".into()));
            }
            Ok(self.users.lock().unwrap().get(&user_id).cloned())
        }

        async fn group_settings(&self, chat_id: i64) -> Result<Option<GroupSettings>, TunebotError> {
            if self.fail {
                return Err(TunebotError::Internal("db down".into()));
            }
            Ok(self.groups.lock().unwrap().get(&chat_id).cloned())
        }
    }

    fn message(chat_id: i64, kind: ChatKind, user_id: i64, is_command: bool) -> MessageContext {
        MessageContext {
            chat_id,
            chat_kind: kind,
            user_id: Some(user_id),
            text: "https://music.163.com/song?id=12345".into(),
            is_command,
        }
    }

    #[tokio::test]
    async fn command_messages_always_allowed() {
        let store = StubStore::default();
        store.users.lock().unwrap().insert(
            42,
            UserSettings {
                user_id: 42,
                default_platform: None,
                auto_link_detect: false,
            },
        );
        assert!(auto_link_detect_enabled(&store, &message(1001, ChatKind::Private, 42, true)).await);
    }

    #[tokio::test]
    async fn private_and_group_settings_apply() {
        let store = StubStore::default();
        store.users.lock().unwrap().insert(
            42,
            UserSettings {
                user_id: 42,
                default_platform: None,
                auto_link_detect: false,
            },
        );
        assert!(!auto_link_detect_enabled(&store, &message(1001, ChatKind::Private, 42, false)).await);

        let group = message(-2001, ChatKind::Group, 99, false);
        store.groups.lock().unwrap().insert(
            -2001,
            GroupSettings {
                chat_id: -2001,
                default_platform: None,
                auto_link_detect: false,
            },
        );
        assert!(!auto_link_detect_enabled(&store, &group).await);

        store.groups.lock().unwrap().remove(&-2001);
        assert!(auto_link_detect_enabled(&store, &group).await);
    }

    #[tokio::test]
    async fn store_errors_default_to_enabled() {
        let store = StubStore {
            fail: true,
            ..StubStore::default()
        };
        assert!(auto_link_detect_enabled(&store, &message(5, ChatKind::Group, 1, false)).await);
    }
}
