//! Command dispatch: protocol commands in, protocol responses out

use chrono::{DateTime, Local};
use focusguard_api::{Command, EventPayload, Response, ResponsePayload};
use focusguard_core::{CoreEngine, CoreError, CoreEvent};
use focusguard_util::ClientId;
use tracing::{debug, error};

/// Run one command against the engine
pub async fn handle_command(
    engine: &CoreEngine,
    client_id: &ClientId,
    request_id: u64,
    command: Command,
    now: DateTime<Local>,
) -> Response {
    match run_command(engine, client_id, command, now).await {
        Ok(payload) => Response::success(request_id, payload),
        Err(e) => error_response(request_id, &e),
    }
}

async fn run_command(
    engine: &CoreEngine,
    client_id: &ClientId,
    command: Command,
    now: DateTime<Local>,
) -> Result<ResponsePayload, CoreError> {
    let payload = match command {
        Command::StartSession {
            duration,
            is_hard_mode,
        } => ResponsePayload::Session {
            session: engine.start_session(duration, is_hard_mode, now).await?,
        },

        Command::StopSession {
            verification_phrase,
        } => {
            engine
                .stop_session(verification_phrase.as_deref(), now)
                .await?;
            ResponsePayload::Stopped
        }

        Command::UpdateBlocklist { blocklist } => {
            engine.update_blocklist(blocklist).await?;
            ResponsePayload::Updated
        }

        Command::UpdateBlockGroups { websites } => {
            // The list is informational; rules are always derived from storage
            debug!(websites = websites.len(), "Block groups update requested");
            engine.update_block_groups().await?;
            ResponsePayload::Updated
        }

        Command::GetSessionStatus => ResponsePayload::Session {
            session: engine.session_status(now)?,
        },

        Command::GetVerificationPhrase => ResponsePayload::Phrase {
            phrase: engine.verification_phrase()?,
        },

        Command::GetStats => ResponsePayload::Stats {
            stats: engine.stats()?,
        },

        Command::GetBlocklist => ResponsePayload::Blocklist {
            blocklist: engine.blocklist()?,
        },

        Command::ListGroups => ResponsePayload::Groups {
            groups: engine.list_groups()?,
        },

        Command::CreateGroup {
            name,
            websites,
            time_limit,
        } => ResponsePayload::GroupCreated {
            group: engine.create_group(&name, &websites, time_limit, now).await?,
        },

        Command::ToggleGroup { name } => {
            let active = engine.toggle_group(&name).await?;
            ResponsePayload::GroupToggled { name, active }
        }

        Command::DeleteGroup { name } => {
            let removed = engine.delete_group(&name).await?;
            ResponsePayload::GroupDeleted { name: removed.name }
        }

        Command::GetCustomContent => ResponsePayload::CustomContent {
            content: engine.custom_content()?,
        },

        Command::SetCustomContent { content } => {
            engine.set_custom_content(&content)?;
            ResponsePayload::Updated
        }

        // The IPC layer tracks the subscription flag itself
        Command::SubscribeEvents => ResponsePayload::Subscribed {
            client_id: client_id.clone(),
        },

        Command::UnsubscribeEvents => ResponsePayload::Unsubscribed,

        Command::GetHealth => ResponsePayload::Health(engine.health()),

        Command::Ping => ResponsePayload::Pong,
    };

    Ok(payload)
}

fn error_response(request_id: u64, e: &CoreError) -> Response {
    if e.is_validation() {
        debug!(error = %e, "Request rejected");
    } else {
        error!(error = %e, "Request failed");
    }
    Response::error(request_id, e.to_error_info())
}

/// Wire form of a core event
pub fn event_payload(event: CoreEvent) -> EventPayload {
    match event {
        CoreEvent::SessionStarted { session } => EventPayload::SessionStarted { session },
        CoreEvent::SessionEnded {
            reason,
            focus_minutes,
        } => EventPayload::SessionEnded {
            reason,
            focus_minutes,
        },
        CoreEvent::RulesSynchronized {
            session_active,
            rule_count,
        } => EventPayload::RulesSynchronized {
            session_active,
            rule_count,
        },
        CoreEvent::StatsChanged { stats } => EventPayload::StatsChanged { stats },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use focusguard_api::{BlocklistItem, ErrorCode};
    use focusguard_config::Policy;
    use focusguard_host_api::{MockRuleTable, MockScheduler};
    use focusguard_store::SqliteStore;
    use std::sync::Arc;

    fn engine() -> CoreEngine {
        CoreEngine::new(
            Policy::default(),
            Arc::new(SqliteStore::in_memory().unwrap()),
            Arc::new(MockRuleTable::new()),
            Arc::new(MockScheduler::new()),
        )
    }

    async fn send(engine: &CoreEngine, command: Command) -> Response {
        handle_command(engine, &ClientId::new(), 1, command, focusguard_util::now()).await
    }

    #[tokio::test]
    async fn start_without_sites_reports_error() {
        let engine = engine();
        let response = send(
            &engine,
            Command::StartSession {
                duration: 25,
                is_hard_mode: false,
            },
        )
        .await;

        assert!(!response.success);
        let error = response.error.unwrap();
        assert_eq!(error.code, ErrorCode::NoWebsitesToBlock);
        assert_eq!(error.message, "No websites to block");
    }

    #[tokio::test]
    async fn start_then_status() {
        let engine = engine();
        send(
            &engine,
            Command::UpdateBlocklist {
                blocklist: vec![BlocklistItem::Pattern("a.com".into())],
            },
        )
        .await;

        let response = send(
            &engine,
            Command::StartSession {
                duration: 25,
                is_hard_mode: true,
            },
        )
        .await;
        assert!(response.success);

        let response = send(&engine, Command::GetSessionStatus).await;
        match response.into_result().unwrap() {
            ResponsePayload::Session { session } => {
                assert!(session.active);
                assert!(session.is_hard_mode);
                assert!(!session.verification_phrase.is_empty());
            }
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[tokio::test]
    async fn wrong_phrase_reports_incorrect() {
        let engine = engine();
        send(
            &engine,
            Command::UpdateBlocklist {
                blocklist: vec![BlocklistItem::Pattern("a.com".into())],
            },
        )
        .await;
        send(
            &engine,
            Command::StartSession {
                duration: 25,
                is_hard_mode: true,
            },
        )
        .await;

        let response = send(
            &engine,
            Command::StopSession {
                verification_phrase: Some("nope".into()),
            },
        )
        .await;

        let error = response.into_result().unwrap_err();
        assert_eq!(error.code, ErrorCode::IncorrectPhrase);
        assert_eq!(error.message, "Incorrect verification phrase");
    }

    #[tokio::test]
    async fn group_commands() {
        let engine = engine();
        let response = send(
            &engine,
            Command::CreateGroup {
                name: "Mine".into(),
                websites: vec!["https://www.a.com/x".into()],
                time_limit: None,
            },
        )
        .await;
        match response.into_result().unwrap() {
            ResponsePayload::GroupCreated { group } => {
                assert_eq!(group.websites, vec!["a.com"]);
                assert_eq!(group.time_limit, 60);
            }
            other => panic!("unexpected payload: {:?}", other),
        }

        let response = send(&engine, Command::ToggleGroup { name: "Mine".into() }).await;
        assert!(matches!(
            response.into_result().unwrap(),
            ResponsePayload::GroupToggled { active: true, .. }
        ));

        let response = send(&engine, Command::DeleteGroup { name: "nope".into() }).await;
        assert_eq!(response.into_result().unwrap_err().code, ErrorCode::GroupNotFound);
    }

    #[tokio::test]
    async fn ping_and_health() {
        let engine = engine();
        assert!(matches!(
            send(&engine, Command::Ping).await.into_result().unwrap(),
            ResponsePayload::Pong
        ));
        assert!(matches!(
            send(&engine, Command::GetHealth).await.into_result().unwrap(),
            ResponsePayload::Health(h) if h.live && h.store_ok
        ));
    }
}
