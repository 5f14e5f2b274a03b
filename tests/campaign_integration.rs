//! End-to-end campaign run: CSV in, Ollama and MailHog mocked over HTTP,
//! SMTP replaced by a recording transport, CSV and report out.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use outreach_pipeline::channels::{MailHogInbox, MailTransport, OutgoingEmail};
use outreach_pipeline::config::CampaignConfig;
use outreach_pipeline::error::TransportError;
use outreach_pipeline::llm::create_provider;
use outreach_pipeline::pipeline::{CampaignPipeline, Category, DeliveryStatus};
use outreach_pipeline::report::{CampaignStats, write_report};
use outreach_pipeline::store::{load_leads, write_results};

const LEADS: &str = "\
name,email,company,title
Ann Lee,ann@globex.test,Globex,CTO
Bo Chen,bo@nowhere.test,,
Cy Diaz,cy@bounce.test,Umbrella,CFO
";

/// Records every send; addresses at `bounce.test` are refused.
#[derive(Default)]
struct RecordingTransport {
    sent: Mutex<Vec<OutgoingEmail>>,
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, email: &OutgoingEmail) -> Result<String, TransportError> {
        if email.to.ends_with("@bounce.test") {
            return Err(TransportError::SendFailed("550 mailbox unavailable".into()));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(format!("<{}@acme.test>", self.sent.lock().unwrap().len()))
    }
}

fn enrichment(persona: &str, priority: i64) -> ResponseTemplate {
    let payload = json!({
        "persona": persona,
        "priority": priority,
        "missing_fields": [],
        "insight": "is hiring engineers",
        "value_prop": "automating onboarding",
        "enriched": {},
    });
    ResponseTemplate::new(200).set_body_json(json!({
        "response": format!("Here you go:\n{payload}"),
    }))
}

async fn mock_ollama() -> MockServer {
    let server = MockServer::start().await;
    for (email, persona, priority) in [
        ("ann@globex.test", "Engineering", 60),
        ("bo@nowhere.test", "Founder", 90),
        ("cy@bounce.test", "Finance", 30),
    ] {
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_string_contains(email))
            .respond_with(enrichment(persona, priority))
            .mount(&server)
            .await;
    }
    Mock::given(method("POST"))
        .and(path("/api/pull"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
        .mount(&server)
        .await;
    server
}

async fn mock_mailhog(bodies: &[(&str, &str)]) -> MockServer {
    let server = MockServer::start().await;
    let items: Vec<_> = bodies
        .iter()
        .map(|(to, body)| {
            let (mailbox, domain) = to.split_once('@').unwrap();
            json!({
                "ID": "id",
                "To": [{"Mailbox": mailbox, "Domain": domain, "Params": ""}],
                "Content": {"Headers": {}, "Body": body},
            })
        })
        .collect();
    Mock::given(method("GET"))
        .and(path("/api/v2/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": items.len(),
            "count": items.len(),
            "start": 0,
            "items": items,
        })))
        .mount(&server)
        .await;
    server
}

fn config(ollama: &MockServer, mailhog: &MockServer, dir: &std::path::Path, fake_replies: bool) -> CampaignConfig {
    let vars: HashMap<&str, String> = HashMap::from([
        ("LLM_PROVIDER", "ollama".to_string()),
        ("OLLAMA_HOST", ollama.uri()),
        ("FROM_EMAIL", "sdr@acme.test".to_string()),
        ("MAILHOG_API", format!("{}/api/v2/messages", mailhog.uri())),
        ("LEADS_CSV", dir.join("leads.csv").display().to_string()),
        ("OUTPUT_CSV", dir.join("out/leads_out.csv").display().to_string()),
        ("REPORTS_DIR", dir.join("reports").display().to_string()),
        ("GENERATE_FAKE_REPLIES", fake_replies.to_string()),
    ]);
    CampaignConfig::from_lookup(|k| vars.get(k).cloned()).unwrap()
}

#[tokio::test]
async fn campaign_runs_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("leads.csv"), LEADS).unwrap();

    let ollama = mock_ollama().await;
    let mailhog = mock_mailhog(&[
        ("sdr@acme.test", "Sounds great, let's talk Tuesday."),
        ("someone@else.test", "Not for us"),
        ("sdr@acme.test", "Please unsubscribe me."),
    ])
    .await;
    let config = config(&ollama, &mailhog, dir.path(), false);

    let llm = create_provider(&config.llm).unwrap();
    let transport = Arc::new(RecordingTransport::default());
    let inbox = Arc::new(MailHogInbox::new(&config.mailhog_api));
    let pipeline = CampaignPipeline::new(&config, llm, transport.clone(), inbox).unwrap();

    let leads = load_leads(&config.leads_csv, config.max_leads).unwrap();
    let records = pipeline.run(leads).await;

    // Ann and Bo delivered, Cy refused
    let sent = transport.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1].to, "bo@nowhere.test");
    assert_eq!(sent[1].subject, "Quick idea for your team");
    assert!(sent[1].body.starts_with("Hi Bo Chen,\n"));
    assert!(sent[1].body.contains("I noticed your team is hiring engineers."));
    assert!(sent[1].body.contains("tailored to your context."));

    // Replies pair with Ann then Bo by position; sorted by label then priority
    let summary: Vec<(&str, String, i64)> = records
        .iter()
        .map(|r| (r.lead.get("email").unwrap(), r.response_category.to_string(), r.priority))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("ann@globex.test", "Interested".to_string(), 60),
            ("cy@bounce.test", "No Response Yet".to_string(), 30),
            ("bo@nowhere.test", "Unsubscribe".to_string(), 90),
        ]
    );
    assert_eq!(records[0].status, DeliveryStatus::Replied);
    assert_eq!(records[0].last_response, "Sounds great, let's talk Tuesday.");
    assert_eq!(
        records[1].status,
        DeliveryStatus::SendError("550 mailbox unavailable".into())
    );
    assert_eq!(records[1].response_category, Category::NoResponseYet);

    write_results(&config.output_csv, &records).unwrap();
    let mut reader = csv::Reader::from_path(&config.output_csv).unwrap();
    let header: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(&header[..4], ["name", "email", "company", "title"]);
    assert_eq!(header.last().unwrap(), "response_category");
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(&rows[1][10], "SendError: 550 mailbox unavailable");

    let stats = CampaignStats::from_records(&records);
    assert_eq!((stats.total, stats.delivered, stats.replied), (3, 2, 2));
    let now = NaiveDate::from_ymd_opt(2026, 1, 2)
        .unwrap()
        .and_hms_opt(15, 30, 0)
        .unwrap();
    let report = write_report(&config.reports_dir, &stats, &records, now).unwrap();
    let markdown = std::fs::read_to_string(&report).unwrap();
    assert!(report.ends_with("report-20260102-1530.md"));
    assert!(markdown.contains("- Bo Chen —  — priority 90 — Unsubscribe\n"));
}

#[tokio::test]
async fn simulated_replies_go_to_campaign_address() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("leads.csv"), LEADS).unwrap();

    let ollama = mock_ollama().await;
    let mailhog = mock_mailhog(&[]).await;
    let config = config(&ollama, &mailhog, dir.path(), true);

    let llm = create_provider(&config.llm).unwrap();
    let transport = Arc::new(RecordingTransport::default());
    let inbox = Arc::new(MailHogInbox::new(&config.mailhog_api));
    let pipeline = CampaignPipeline::new(&config, llm, transport.clone(), inbox).unwrap();

    let records = pipeline
        .run(load_leads(&config.leads_csv, 0).unwrap())
        .await;
    assert_eq!(records.len(), 3);

    let sent = transport.sent.lock().unwrap().clone();
    let replies: Vec<&OutgoingEmail> = sent.iter().filter(|e| e.to == "sdr@acme.test").collect();
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0].subject, "Re: Quick idea for Globex");
    assert!(replies[0].message_id.as_deref().unwrap().starts_with("<reply-"));

    // Empty inbox: nothing was matched
    assert!(records.iter().all(|r| r.response_category == Category::NoResponseYet));
}

#[tokio::test]
async fn unreachable_inbox_leaves_records_unanswered() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("leads.csv"), LEADS).unwrap();

    let ollama = mock_ollama().await;
    let mailhog = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mailhog)
        .await;
    let config = config(&ollama, &mailhog, dir.path(), false);

    let llm = create_provider(&config.llm).unwrap();
    let pipeline = CampaignPipeline::new(
        &config,
        llm,
        Arc::new(RecordingTransport::default()),
        Arc::new(MailHogInbox::new(&config.mailhog_api)),
    )
    .unwrap();

    let records = pipeline
        .run(load_leads(&config.leads_csv, 2).unwrap())
        .await;
    assert_eq!(records.len(), 2);
    // Same category, so priority decides
    assert_eq!(records[0].lead.get("email"), Some("bo@nowhere.test"));
    assert!(records.iter().all(|r| r.status == DeliveryStatus::Sent));
}
