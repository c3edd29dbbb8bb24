//! Exercise a write/read/trim cycle against the in-memory column store.
//!
//! Usage: journal_smoke [IMPU]

use calljournal_core::{format_timestamp, fragments_before, new_call_id, CallFragment, FragmentType, JournalConfig};
use calljournal_events::{RecordingSink, TeeSink, TracingSink, TrailId};
use calljournal_storage::{CallListStore, MockColumnStore};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("calljournal=debug,info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().json())
        .try_init()?;

    let config = JournalConfig::from_env()?;
    let impu = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sip:kermit@example.com".to_string());

    let recorder = Arc::new(RecordingSink::new());
    let sink = Arc::new(TeeSink::new(TracingSink, recorder.clone()));
    let client = Arc::new(MockColumnStore::with_keyspace(config.keyspace.clone()));
    let store = CallListStore::new(client, sink, config)?;
    let trail = TrailId(0x5eed);

    // Two calls a minute apart: one answered, one rejected.
    let now = Utc::now();
    let earlier = format_timestamp(now - Duration::minutes(1));
    let later = format_timestamp(now);
    let answered = new_call_id();
    let rejected = new_call_id();
    let fragments = [
        CallFragment::new(earlier.clone(), answered.clone(), FragmentType::Begin, "<call answered/>"),
        CallFragment::new(earlier, answered, FragmentType::End, "<call ended/>"),
        CallFragment::new(later.clone(), rejected, FragmentType::Rejected, "<call rejected/>"),
    ];

    let mut cass_timestamp = now.timestamp_micros();
    for fragment in fragments {
        fragment.validate()?;
        cass_timestamp += 1;
        store.write_call_fragment_with_default_ttl(&impu, fragment, cass_timestamp, trail)?;
    }

    let history = store.get_call_fragments_sync(&impu, trail)?;
    println!("{}", serde_json::to_string_pretty(&history)?);

    let old = fragments_before(&history, &later);
    cass_timestamp += 1;
    store.delete_old_call_fragments_sync(&impu, old, cass_timestamp, trail)?;

    let remaining = store.get_call_fragments_sync(&impu, trail)?;
    println!("{}", serde_json::to_string_pretty(&remaining)?);

    eprint!("{}", store.metrics().encode_text()?);

    tracing::info!(
        events = recorder.events().len(),
        remaining = remaining.len(),
        "Smoke cycle complete"
    );
    Ok(())
}
