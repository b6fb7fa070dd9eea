use super::*;
use crate::dongle::DongleTransport;
use crate::error::HelioError;
use crate::rules::DecisionReason;
use std::collections::VecDeque;
use std::sync::Mutex;

struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<String>>>,
}

impl ScriptedTransport {
    fn new(responses: Vec<Result<String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
        }
    }
}

#[async_trait::async_trait]
impl DongleTransport for ScriptedTransport {
    async fn read_realtime_data(&self, _serial: &str) -> Result<String> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(HelioError::connection("script exhausted")))
    }
}

fn body(values: &[(usize, u16)]) -> String {
    let mut regs = vec![0u16; 106];
    for (i, v) in values {
        regs[*i] = *v;
    }
    serde_json::json!({ "Data": regs, "type": 5 }).to_string()
}

fn dashboard(responses: Vec<Result<String>>) -> Dashboard {
    let client = DongleClient::new(Box::new(ScriptedTransport::new(responses)), "SXTEST01");
    Dashboard::new(Config::default(), client, None)
}

fn snapshot(soc: i32, feed_in: i32) -> InverterSnapshot {
    InverterSnapshot {
        serial: "SXTEST01".to_string(),
        pv1_power: 2500,
        load_power: 400,
        soc,
        feed_in_power: feed_in,
        ..InverterSnapshot::default()
    }
}

#[tokio::test]
async fn successful_poll_updates_history_and_chart() {
    let mut dash = dashboard(vec![Ok(body(&[(14, 1200), (15, 300), (47, 650), (103, 64)]))]);
    let rx = dash.subscribe();

    dash.poll_cycle().await.unwrap();

    assert_eq!(dash.history().len(), 1);
    assert_eq!(dash.chart().len(), 1);
    assert_eq!(dash.last_status(), DongleStatus::Ok);

    let published = rx.borrow().clone();
    assert_eq!(published.total_polls, 1);
    assert_eq!(published.failed_polls, 0);
    assert_eq!(published.serial, "SXTEST01");
    let inverter = published.inverter.clone().unwrap();
    assert_eq!(inverter.pv_power(), 1500);
    assert_eq!(inverter.soc, 64);
    assert_eq!(published.chart[0].pv_power(), Some(1500.0));
    assert_eq!(published.chart[0].load_power(), Some(650.0));
}

#[tokio::test]
async fn failed_poll_leaves_state_untouched() {
    let mut dash = dashboard(vec![
        Ok(body(&[(103, 50)])),
        Err(HelioError::http(500)),
        Ok(r#"{"nope":true}"#.to_string()),
    ]);

    dash.poll_cycle().await.unwrap();
    let history_before = dash.history().to_vec();
    let chart_before = dash.chart().to_vec();

    let err = dash.poll_cycle().await.unwrap_err();
    assert!(matches!(err, HelioError::Http { status: 500 }));
    assert_eq!(dash.last_status(), DongleStatus::HttpError);
    assert_eq!(dash.last_status().code(), -2);

    let err = dash.poll_cycle().await.unwrap_err();
    assert!(matches!(err, HelioError::Protocol { .. }));
    assert_eq!(dash.last_status().code(), -3);

    assert_eq!(dash.history().to_vec(), history_before);
    assert_eq!(dash.chart().to_vec(), chart_before);
    assert_eq!(dash.total_polls(), 3);
    assert_eq!(dash.failed_polls(), 2);

    let published = dash.subscribe().borrow().clone();
    assert_eq!(published.status_text, "JSON error");
    // last good data stays visible
    assert_eq!(published.inverter.as_ref().map(|i| i.soc), Some(50));
}

#[test]
fn decision_follows_history_readiness() {
    let mut dash = dashboard(Vec::new());
    for i in 0..9 {
        dash.apply_snapshot(i * 5_000, snapshot(99, 0));
        assert!(!dash.decision().active);
        assert_eq!(dash.smart_control(), SmartControlState::Unknown);
    }
    dash.apply_snapshot(45_000, snapshot(99, 0));
    assert_eq!(dash.decision().reason, DecisionReason::BatteryFull);
    assert!(dash.decision().active);
    assert_eq!(dash.smart_control(), SmartControlState::FullOn);
    // all ten samples land in the same 5-minute bucket
    assert_eq!(dash.chart().len(), 1);
    assert_eq!(dash.chart().latest().map(|b| b.sample_count), Some(10));
}

#[test]
fn logger_tags_serial_and_dongle_url() {
    let dash = dashboard(Vec::new());
    assert_eq!(
        dash.logger.format_fields(),
        "component=dashboard,serial=SXTEST01,url=http://5.8.8.8"
    );
}

#[tokio::test]
async fn run_stops_on_shutdown() {
    let mut config = Config::default();
    config.poll_interval_ms = 10;
    let client = DongleClient::new(Box::new(ScriptedTransport::new(Vec::new())), "SXTEST01");
    let mut dash = Dashboard::new(config, client, None);
    let shutdown = dash.shutdown_handle();
    let rx = dash.subscribe();

    shutdown.send(()).unwrap();
    dash.run().await.unwrap();

    assert_eq!(rx.borrow().state, DashboardState::ShuttingDown);
}
