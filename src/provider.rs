use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use chrono::Local;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::gemini::ModelClient;
use crate::service;
use crate::state::{Delta, ProviderCommand, format_date};

/// Dispatches each command to its own worker so a slow analysis never holds
/// up a fixture refresh. Results come back tagged with the command's
/// generation; the UI decides whether they are still current.
pub fn spawn_provider(
    client: Arc<dyn ModelClient>,
    config: AppConfig,
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
) -> thread::JoinHandle<()> {
    let config = Arc::new(config);
    thread::spawn(move || {
        while let Ok(cmd) = cmd_rx.recv() {
            debug!(?cmd, "provider command");
            let client = Arc::clone(&client);
            let config = Arc::clone(&config);
            let worker_tx = tx.clone();
            let spawned = thread::Builder::new()
                .name("statimatch-worker".to_string())
                .spawn(move || run_command(client.as_ref(), &config, cmd, &worker_tx));
            if let Err(err) = spawned {
                warn!(%err, "failed to spawn worker");
                let _ = tx.send(Delta::Log(format!("[WARN] Worker spawn failed: {err}")));
            }
        }
        debug!("command channel closed, provider exiting");
    })
}

pub fn run_command(
    client: &dyn ModelClient,
    config: &AppConfig,
    cmd: ProviderCommand,
    tx: &Sender<Delta>,
) {
    let delta = match cmd {
        ProviderCommand::FetchFixtures {
            generation,
            sport,
            date,
        } => match service::fetch_fixtures(client, config, sport, &date) {
            Ok(matches) => Delta::FixturesLoaded {
                generation,
                date,
                matches,
            },
            Err(err) => {
                let error = format!("{err:#}");
                warn!(%error, "fixture fetch failed");
                Delta::FixturesFailed {
                    generation,
                    sport,
                    error,
                }
            }
        },
        ProviderCommand::DecodeBookingCode { generation, code } => {
            let today = format_date(Local::now().date_naive());
            match service::decode_booking_code(client, config, &code, &today) {
                Ok(matches) => Delta::BookingDecoded {
                    generation,
                    matches,
                },
                Err(err) => {
                    let error = format!("{err:#}");
                    warn!(%error, %code, "booking decode failed");
                    Delta::BookingFailed { generation, error }
                }
            }
        }
        ProviderCommand::Analyze {
            generation,
            query,
            sport,
        } => match service::analyze_match(client, config, &query, sport) {
            Ok(analysis) => Delta::AnalysisReady {
                generation,
                analysis,
            },
            Err(err) => {
                let error = format!("{err:#}");
                warn!(%error, %query, "analysis failed");
                Delta::AnalysisFailed { generation, error }
            }
        },
    };
    let _ = tx.send(delta);
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::time::Duration;

    use super::*;
    use crate::demo_feed::DemoClient;
    use crate::state::Sport;

    #[test]
    fn provider_answers_each_command_with_its_generation() {
        let (tx, rx) = mpsc::channel();
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let client: Arc<dyn ModelClient> = Arc::new(DemoClient::instant());
        spawn_provider(client, AppConfig::default(), tx, cmd_rx);

        cmd_tx
            .send(ProviderCommand::FetchFixtures {
                generation: 3,
                sport: Sport::Basketball,
                date: "2024-10-27".to_string(),
            })
            .unwrap();
        cmd_tx
            .send(ProviderCommand::DecodeBookingCode {
                generation: 9,
                code: "XYZ".to_string(),
            })
            .unwrap();

        let mut seen = Vec::new();
        for _ in 0..2 {
            match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
                Delta::FixturesLoaded { generation, .. } => seen.push(("fixtures", generation)),
                Delta::BookingDecoded { generation, .. } => seen.push(("booking", generation)),
                other => panic!("unexpected delta {other:?}"),
            }
        }
        seen.sort();
        assert_eq!(seen, vec![("booking", 9), ("fixtures", 3)]);
    }
}
