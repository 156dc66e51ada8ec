//! NATS JetStream queue client and message types.

use anyhow::Result;
use async_nats::jetstream::{self, consumer::PullConsumer, stream::Stream as JsStream};
use serde::{Deserialize, Serialize};

pub const INGEST_STREAM: &str = "LOADBENCH_INGEST";
pub const INGEST_SUBJECT: &str = "loadbench.ingest";

/// Job kinds that flow through the queue. `Ingestion` carries the staged
/// file location; `Analysis`/`Qa` are orchestration-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum JobMessage {
    Ingestion {
        job_id: i64,
        ingestion_job_id: i64,
        file_path: String,
        file_type: String,
    },
    Analysis {
        job_id: i64,
    },
    Qa {
        job_id: i64,
    },
}

pub struct QueueClient {
    ingest_stream: tokio::sync::Mutex<JsStream>,
}

impl QueueClient {
    pub async fn connect(nats_url: &str) -> Result<Self> {
        let client = async_nats::connect(nats_url).await?;
        let jetstream = jetstream::new(client);

        let ingest_stream = jetstream
            .get_or_create_stream(jetstream::stream::Config {
                name: INGEST_STREAM.to_string(),
                subjects: vec![INGEST_SUBJECT.to_string()],
                retention: jetstream::stream::RetentionPolicy::WorkQueue,
                ..Default::default()
            })
            .await?;

        Ok(Self {
            ingest_stream: tokio::sync::Mutex::new(ingest_stream),
        })
    }

    /// Durable pull consumer shared across every worker process, with
    /// explicit ack so a job is only considered delivered once its
    /// terminal status has been written.
    pub async fn ingest_consumer(&self) -> Result<PullConsumer> {
        let stream = self.ingest_stream.lock().await;
        let consumer = stream
            .get_or_create_consumer(
                "loadbench-ingest-workers",
                jetstream::consumer::pull::Config {
                    durable_name: Some("loadbench-ingest-workers".to_string()),
                    ack_policy: jetstream::consumer::AckPolicy::Explicit,
                    ..Default::default()
                },
            )
            .await?;
        Ok(consumer)
    }

    pub async fn ingest_queue_depth(&self) -> Result<u64> {
        let mut stream = self.ingest_stream.lock().await;
        let info = stream.info().await?;
        Ok(info.state.messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingestion_message_roundtrip() {
        let msg = JobMessage::Ingestion {
            job_id: 1,
            ingestion_job_id: 2,
            file_path: "/data/run.json".to_string(),
            file_type: "json".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""kind":"Ingestion""#));
        let deserialized: JobMessage = serde_json::from_str(&json).unwrap();
        match deserialized {
            JobMessage::Ingestion { job_id, ingestion_job_id, .. } => {
                assert_eq!(job_id, 1);
                assert_eq!(ingestion_job_id, 2);
            }
            _ => panic!("expected Ingestion"),
        }
    }

    #[test]
    fn analysis_and_qa_messages_carry_only_job_id() {
        let a = JobMessage::Analysis { job_id: 5 };
        let q = JobMessage::Qa { job_id: 6 };
        assert!(serde_json::to_string(&a).unwrap().contains(r#""kind":"Analysis""#));
        assert!(serde_json::to_string(&q).unwrap().contains(r#""kind":"Qa""#));
    }

    #[test]
    fn constants_are_correct() {
        assert_eq!(INGEST_STREAM, "LOADBENCH_INGEST");
        assert_eq!(INGEST_SUBJECT, "loadbench.ingest");
    }
}
