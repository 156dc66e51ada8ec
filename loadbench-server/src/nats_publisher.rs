//! Publishes job messages onto NATS JetStream for `loadbench-worker` to
//! consume.

use anyhow::Result;
use async_nats::jetstream::{self, context::Context as JsContext};
use serde::{Deserialize, Serialize};

pub const INGEST_STREAM: &str = "LOADBENCH_INGEST";
pub const INGEST_SUBJECT: &str = "loadbench.ingest";

/// Must stay field-for-field compatible with `loadbench-worker::queue::
/// JobMessage` — the worker deserializes whatever is published here.
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

pub struct NatsPublisher {
    jetstream: JsContext,
}

impl NatsPublisher {
    pub async fn connect(nats_url: &str) -> Result<Self> {
        let client = async_nats::connect(nats_url).await?;
        let jetstream = jetstream::new(client);

        jetstream
            .get_or_create_stream(jetstream::stream::Config {
                name: INGEST_STREAM.to_string(),
                subjects: vec![INGEST_SUBJECT.to_string()],
                retention: jetstream::stream::RetentionPolicy::WorkQueue,
                ..Default::default()
            })
            .await?;

        Ok(Self { jetstream })
    }

    async fn publish(&self, msg: &JobMessage) -> Result<()> {
        let payload = serde_json::to_vec(msg)?;
        self.jetstream.publish(INGEST_SUBJECT, payload.into()).await?.await?;
        Ok(())
    }

    pub async fn publish_ingestion(
        &self,
        job_id: i64,
        ingestion_job_id: i64,
        file_path: &str,
        file_type: &str,
    ) -> Result<()> {
        self.publish(&JobMessage::Ingestion {
            job_id,
            ingestion_job_id,
            file_path: file_path.to_string(),
            file_type: file_type.to_string(),
        })
        .await
    }

    pub async fn publish_analysis(&self, job_id: i64) -> Result<()> {
        self.publish(&JobMessage::Analysis { job_id }).await
    }

    pub async fn publish_qa(&self, job_id: i64) -> Result<()> {
        self.publish(&JobMessage::Qa { job_id }).await
    }
}
