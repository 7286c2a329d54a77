//! Named one-shot alarms on tokio timers

use async_trait::async_trait;
use focusguard_host_api::{AlarmEvent, AlarmScheduler, HostError, HostResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

struct ArmedAlarm {
    generation: u64,
    task: JoinHandle<()>,
}

type AlarmMap = Arc<Mutex<HashMap<String, ArmedAlarm>>>;

/// Alarm scheduler driven by `tokio::time::sleep`.
///
/// Alarms live only as long as the process; the service re-arms a running
/// session's alarm on startup.
pub struct TokioAlarmScheduler {
    alarms: AlarmMap,
    next_generation: AtomicU64,
    event_tx: mpsc::UnboundedSender<AlarmEvent>,
    event_rx: Arc<Mutex<Option<mpsc::UnboundedReceiver<AlarmEvent>>>>,
}

impl TokioAlarmScheduler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        Self {
            alarms: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(1),
            event_tx: tx,
            event_rx: Arc::new(Mutex::new(Some(rx))),
        }
    }

    /// Whether `name` is currently armed
    pub fn is_armed(&self, name: &str) -> bool {
        self.alarms
            .lock()
            .map(|alarms| alarms.contains_key(name))
            .unwrap_or(false)
    }

    fn lock_alarms(&self) -> HostResult<std::sync::MutexGuard<'_, HashMap<String, ArmedAlarm>>> {
        self.alarms
            .lock()
            .map_err(|_| HostError::Internal("Alarm table lock poisoned".into()))
    }
}

impl Default for TokioAlarmScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AlarmScheduler for TokioAlarmScheduler {
    async fn create(&self, name: &str, delay: Duration) -> HostResult<()> {
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
        let alarms = self.alarms.clone();
        let tx = self.event_tx.clone();
        let alarm_name = name.to_string();

        let mut table = self.lock_alarms()?;

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            // Only fire if this alarm was not replaced or cleared meanwhile
            let still_armed = match alarms.lock() {
                Ok(mut alarms) => match alarms.get(&alarm_name) {
                    Some(armed) if armed.generation == generation => {
                        alarms.remove(&alarm_name);
                        true
                    }
                    _ => false,
                },
                Err(_) => false,
            };

            if still_armed {
                info!(alarm = %alarm_name, "Alarm fired");
                let _ = tx.send(AlarmEvent { name: alarm_name });
            }
        });

        if let Some(previous) = table.insert(name.to_string(), ArmedAlarm { generation, task }) {
            previous.task.abort();
            debug!(alarm = %name, "Replaced armed alarm");
        }

        debug!(alarm = %name, delay_secs = delay.as_secs(), "Alarm armed");
        Ok(())
    }

    async fn clear(&self, name: &str) -> HostResult<bool> {
        let removed = self.lock_alarms()?.remove(name);
        match removed {
            Some(armed) => {
                armed.task.abort();
                debug!(alarm = %name, "Alarm cleared");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn subscribe(&self) -> Option<mpsc::UnboundedReceiver<AlarmEvent>> {
        self.event_rx.lock().ok().and_then(|mut rx| rx.take())
    }
}
