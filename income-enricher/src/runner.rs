//! JSON-lines loop: read behov packets, answer accepted ones concurrently,
//! write one line back per answered packet.

use anyhow::{Context, Result};
use income_registry::IncomeRegistry;
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::task::JoinSet;

use crate::enricher::Enricher;
use crate::error::EnrichError;
use crate::packet::{self, BehovPacket, BEHOV_ID};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub received: usize,
    pub skipped: usize,
    pub published: usize,
    pub failed: usize,
}

type Outcome = (String, Result<BehovPacket, EnrichError>);

/// Runs until input ends and every accepted packet is settled. Answers are
/// written and flushed as soon as they finish, even while input is idle.
pub async fn run<R, I, O>(
    enricher: Arc<Enricher<R>>,
    input: I,
    mut output: O,
    max_in_flight: usize,
) -> Result<RunStats>
where
    R: IncomeRegistry + 'static,
    I: AsyncBufRead + Unpin,
    O: AsyncWrite + Unpin,
{
    let max_in_flight = max_in_flight.max(1);
    let mut stats = RunStats::default();
    let mut tasks: JoinSet<Outcome> = JoinSet::new();
    let mut lines = input.lines();
    let mut input_open = true;

    loop {
        tokio::select! {
            line = lines.next_line(), if input_open && tasks.len() < max_in_flight => {
                match line.context("read input")? {
                    Some(line) => dispatch(&line, &enricher, &mut tasks, &mut stats),
                    None => input_open = false,
                }
            }
            Some(done) = tasks.join_next(), if !tasks.is_empty() => {
                publish(done, &mut output, &mut stats).await?;
            }
            else => break,
        }
    }
    output.flush().await.context("flush output")?;

    tracing::info!(
        received = stats.received,
        skipped = stats.skipped,
        published = stats.published,
        failed = stats.failed,
        "input drained"
    );
    Ok(stats)
}

fn dispatch<R: IncomeRegistry + 'static>(
    line: &str,
    enricher: &Arc<Enricher<R>>,
    tasks: &mut JoinSet<Outcome>,
    stats: &mut RunStats,
) {
    if line.trim().is_empty() {
        return;
    }
    stats.received += 1;
    tracing::debug!(target: "sensitive", packet = %line, "received");

    let value: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!(error = %e, "skipping record that is not JSON");
            stats.skipped += 1;
            return;
        }
    };
    if !packet::accepts(&value) {
        tracing::debug!("skipping record not meant for us");
        stats.skipped += 1;
        return;
    }

    let enricher = Arc::clone(enricher);
    tasks.spawn(async move {
        let behov_id = value
            .get(BEHOV_ID)
            .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
            .unwrap_or_default();
        let result = match BehovPacket::from_value(value) {
            Ok(p) => enricher.enrich(p).await,
            Err(e) => Err(e.into()),
        };
        (behov_id, result)
    });
}

async fn publish<O: AsyncWrite + Unpin>(
    done: std::result::Result<Outcome, tokio::task::JoinError>,
    output: &mut O,
    stats: &mut RunStats,
) -> Result<()> {
    let (behov_id, result) = match done {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(error = %e, "enrich task did not finish");
            stats.failed += 1;
            return Ok(());
        }
    };

    match result {
        Ok(packet) => {
            let line = packet.to_json().context("serialize packet")?;
            tracing::debug!(target: "sensitive", packet = %line, "publishing");
            output.write_all(line.as_bytes()).await.context("write output")?;
            output.write_all(b"\n").await.context("write output")?;
            output.flush().await.context("flush output")?;
            if packet.problem().is_some() {
                tracing::info!(%behov_id, "published problem");
            } else {
                tracing::info!(%behov_id, "published income");
            }
            stats.published += 1;
        }
        Err(e) => {
            tracing::error!(%behov_id, error = %e, "failed to answer behov");
            stats.failed += 1;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use income_core::{ClassifiedIncome, Problem, RawIncome, YearMonth};
    use income_registry::{ContextRequest, RegistryError};

    /// Knows one stored income; every context lookup fails.
    struct StoredOnly;

    #[async_trait]
    impl IncomeRegistry for StoredOnly {
        async fn fetch_classified_by_id(
            &self,
            income_id: &str,
            _call_id: &str,
        ) -> Result<ClassifiedIncome, RegistryError> {
            if income_id != "12345" {
                return Err(RegistryError::new(
                    "not found",
                    Problem::new("about:blank", "Not found").with_status(404),
                ));
            }
            Ok(ClassifiedIncome {
                income_id: income_id.to_string(),
                monthly_incomes: vec![],
                manually_edited: false,
                last_closed_month: YearMonth::new(2019, 2).unwrap(),
            })
        }

        async fn fetch_raw_by_context(
            &self,
            _request: &ContextRequest,
            _call_id: &str,
        ) -> Result<RawIncome, RegistryError> {
            Err(RegistryError::new("down", Problem::new("urn:dp:error:inntektskomponenten", "down")))
        }

        async fn fetch_classified_by_context(
            &self,
            _request: &ContextRequest,
            _call_id: &str,
        ) -> Result<ClassifiedIncome, RegistryError> {
            Err(RegistryError::new("down", Problem::new("urn:dp:error:inntektskomponenten", "down")))
        }
    }

    async fn run_lines(input: &str, max_in_flight: usize) -> (RunStats, Vec<Value>) {
        let enricher = Arc::new(Enricher::new(StoredOnly));
        let mut out = Vec::new();
        let stats = run(enricher, input.as_bytes(), &mut out, max_in_flight)
            .await
            .unwrap();
        let lines = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        (stats, lines)
    }

    #[tokio::test]
    async fn test_answers_each_accepted_packet_once() {
        let input = [
            r#"{"behovId":"a","inntektsId":"12345"}"#,
            r#"{"behovId":"b","aktørId":"1","kontekstId":"1","kontekstType":"vedtak","beregningsDato":"2020-01-01"}"#,
            r#"{"behovId":"c","inntektV1":{}}"#,
            r#"{"behovId":"d","system_problem":{"title":"x"}}"#,
            r#"{"noBehov":true}"#,
            "not json",
            "",
        ]
        .join("\n");

        let (stats, lines) = run_lines(&input, 2).await;

        assert_eq!(
            stats,
            RunStats {
                received: 6,
                skipped: 4,
                published: 2,
                failed: 0,
            }
        );
        let mut ids: Vec<&str> = lines.iter().map(|l| l["behovId"].as_str().unwrap()).collect();
        ids.sort();
        assert_eq!(ids, vec!["a", "b"]);

        let a = lines.iter().find(|l| l["behovId"] == "a").unwrap();
        assert_eq!(a["inntektV1"]["inntektsId"], "12345");
        let b = lines.iter().find(|l| l["behovId"] == "b").unwrap();
        assert_eq!(b["system_problem"]["title"], "down");
        assert!(b.get("inntektV1").is_none());
    }

    #[tokio::test]
    async fn test_fatal_errors_are_dropped_and_loop_continues() {
        let input = [
            r#"{"behovId":"missing-person"}"#,
            r#"{"behovId":"unknown-id","inntektsId":"999"}"#,
            r#"{"behovId":"bad-date","aktørId":"1","kontekstId":"1","kontekstType":"vedtak","beregningsDato":"i morgen"}"#,
            r#"{"behovId":"ok","inntektsId":"12345"}"#,
        ]
        .join("\n");

        let (stats, lines) = run_lines(&input, 1).await;

        assert_eq!(stats.published, 1);
        assert_eq!(stats.failed, 3);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["behovId"], "ok");
    }

    #[tokio::test]
    async fn test_many_packets_with_small_window() {
        let input: Vec<String> = (0..25)
            .map(|i| format!(r#"{{"behovId":"b{i}","inntektsId":"12345"}}"#))
            .collect();

        let (stats, lines) = run_lines(&input.join("\n"), 3).await;

        assert_eq!(stats.published, 25);
        assert_eq!(lines.len(), 25);
    }

    #[tokio::test]
    async fn test_answer_written_while_input_stays_open() {
        let (mut input_tx, input_rx) = tokio::io::duplex(4096);
        let (output_tx, output_rx) = tokio::io::duplex(4096);
        let enricher = Arc::new(Enricher::new(StoredOnly));

        let runner = tokio::spawn(run(
            enricher,
            tokio::io::BufReader::new(input_rx),
            output_tx,
            8,
        ));

        input_tx
            .write_all(b"{\"behovId\":\"a\",\"inntektsId\":\"12345\"}\n")
            .await
            .unwrap();

        let mut answers = tokio::io::BufReader::new(output_rx).lines();
        let line = tokio::time::timeout(std::time::Duration::from_secs(2), answers.next_line())
            .await
            .expect("answer while input is still open")
            .unwrap()
            .unwrap();
        let answer: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(answer["behovId"], "a");
        assert_eq!(answer["inntektV1"]["inntektsId"], "12345");

        drop(input_tx);
        let stats = runner.await.unwrap().unwrap();
        assert_eq!(stats.published, 1);
    }
}
