//! Health insight generation with bounded retries and a static fallback.
//!
//! The provider only turns a prompt into text. Prompt building, JSON
//! parsing, retry pacing and the fallback all live here, so a flaky or
//! missing provider never leaves the caller without an insight.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::InsightError;
use super::traits::InsightProvider;
use crate::config::{INSIGHT_BACKOFF_STEP, INSIGHT_MAX_RETRIES};
use crate::models::Medication;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightResponse {
    pub insight: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interactions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proactive_advice: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_change: Option<SuggestedChange>,
}

/// A schedule adjustment proposed from observed intake times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedChange {
    pub medication_id: String,
    pub medication_name: String,
    pub old_time: String,
    pub new_time: String,
    pub reason: String,
}

impl InsightResponse {
    /// Shown when every attempt failed.
    pub fn fallback() -> Self {
        Self {
            insight: "You're doing great! Keep following your schedule to maintain optimal health."
                .into(),
            interactions: Some(
                "No critical interactions detected at this time. Always consult your doctor \
                 before changing your regimen."
                    .into(),
            ),
            proactive_advice: Some(
                "Stay hydrated and try to take your medications at the same time every day \
                 for the best results."
                    .into(),
            ),
            suggested_change: None,
        }
    }
}

/// Linear backoff: retry `n` waits `n × step`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InsightRetryPolicy {
    pub max_retries: u32,
    pub backoff_step: Duration,
}

impl Default for InsightRetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: INSIGHT_MAX_RETRIES,
            backoff_step: INSIGHT_BACKOFF_STEP,
        }
    }
}

impl InsightRetryPolicy {
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.backoff_step * retry
    }
}

pub fn build_insight_prompt(medications: &[Medication], adherence: u8) -> String {
    let med_list = medications
        .iter()
        .map(|m| {
            let mut line = format!("{} ({}) at {} - Status: {}", m.name, m.dosage, m.scheduled_time, m.status);
            if let Some(taken) = m.last_taken_time {
                line.push_str(&format!(" (Last taken at: {})", taken.format("%-I:%M %p")));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Act as a professional medical assistant and clinical pharmacist.\n\
         Analyze the following medication schedule and adherence data for potential issues.\n\n\
         Current Medications:\n{med_list}\n\n\
         Today's Overall Adherence Rate: {adherence}%\n\n\
         Your task:\n\
         1. Drug Interactions: identify potential drug-drug interactions between the listed \
         medications, or give general safety advice for this combination.\n\
         2. Pattern Analysis: if a medication is consistently taken about 10 minutes or more \
         after its scheduled time, suggest moving the scheduled time to match the habit.\n\
         3. Proactive Health Advice: actionable advice to improve adherence or outcomes.\n\
         4. Concise Insight: a brief, encouraging summary of the current status.\n\n\
         Return a JSON object with fields insight, interactions, proactiveAdvice and an \
         optional suggestedChange {{medicationId, medicationName, oldTime, newTime, reason}}."
    )
}

/// Parse provider output. Blank output counts as a plain encouragement.
pub fn parse_insight_response(text: &str) -> Result<InsightResponse, InsightError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(InsightResponse {
            insight: "You are doing great!".into(),
            interactions: None,
            proactive_advice: None,
            suggested_change: None,
        });
    }
    serde_json::from_str(trimmed).map_err(|e| InsightError::MalformedResponse(e.to_string()))
}

pub struct InsightService<P: InsightProvider> {
    provider: P,
    policy: InsightRetryPolicy,
}

impl<P: InsightProvider> InsightService<P> {
    pub fn new(provider: P) -> Self {
        Self::with_policy(provider, InsightRetryPolicy::default())
    }

    pub fn with_policy(provider: P, policy: InsightRetryPolicy) -> Self {
        Self { provider, policy }
    }

    /// One attempt plus up to `max_retries` retries, then the fallback.
    pub fn health_insights(&self, medications: &[Medication], adherence: u8) -> InsightResponse {
        let prompt = build_insight_prompt(medications, adherence);
        let mut retry = 0;

        loop {
            let result = self
                .provider
                .generate(&prompt)
                .and_then(|text| parse_insight_response(&text));

            match result {
                Ok(response) => return response,
                Err(e) if retry < self.policy.max_retries => {
                    retry += 1;
                    let delay = self.policy.delay_for(retry);
                    tracing::warn!(
                        attempt = retry,
                        max = self.policy.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Insight generation failed, retrying"
                    );
                    std::thread::sleep(delay);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Insight generation exhausted retries, using fallback");
                    return InsightResponse::fallback();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails the first `failures` calls, then answers with `reply`.
    struct FailThenSucceed {
        failures: usize,
        calls: AtomicUsize,
        reply: String,
    }

    impl FailThenSucceed {
        fn new(failures: usize, reply: &str) -> Self {
            Self {
                failures,
                calls: AtomicUsize::new(0),
                reply: reply.to_string(),
            }
        }
    }

    impl InsightProvider for FailThenSucceed {
        fn generate(&self, _prompt: &str) -> Result<String, InsightError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(InsightError::Unavailable("rate limited".into()))
            } else {
                Ok(self.reply.clone())
            }
        }
    }

    fn instant() -> InsightRetryPolicy {
        InsightRetryPolicy {
            max_retries: 3,
            backoff_step: Duration::ZERO,
        }
    }

    const REPLY: &str = r#"{
        "insight": "Solid week.",
        "interactions": "None known.",
        "proactiveAdvice": "Take Metformin with food.",
        "suggestedChange": {
            "medicationId": "1",
            "medicationName": "Metformin",
            "oldTime": "8:00 AM",
            "newTime": "8:15 AM",
            "reason": "Usually taken around 8:12 AM"
        }
    }"#;

    #[test]
    fn backoff_grows_linearly() {
        let policy = InsightRetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_millis(1500));
        assert_eq!(policy.delay_for(2), Duration::from_millis(3000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(4500));
    }

    #[test]
    fn recovers_after_transient_failures() {
        let service = InsightService::with_policy(FailThenSucceed::new(2, REPLY), instant());
        let response = service.health_insights(&[], 80);

        assert_eq!(response.insight, "Solid week.");
        assert_eq!(response.suggested_change.unwrap().new_time, "8:15 AM");
        assert_eq!(service.provider.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn falls_back_after_exhausting_retries() {
        let service = InsightService::with_policy(FailThenSucceed::new(10, REPLY), instant());
        let response = service.health_insights(&[], 80);

        assert_eq!(response, InsightResponse::fallback());
        assert_eq!(service.provider.calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn malformed_json_is_retried() {
        let service = InsightService::with_policy(FailThenSucceed::new(0, "not json"), instant());
        assert_eq!(service.health_insights(&[], 0), InsightResponse::fallback());
        assert_eq!(service.provider.calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn blank_reply_is_plain_encouragement() {
        let parsed = parse_insight_response("  ").unwrap();
        assert_eq!(parsed.insight, "You are doing great!");
        assert!(parsed.suggested_change.is_none());
    }

    #[test]
    fn prompt_lists_medications_and_adherence() {
        let meds = vec![Medication::new("1", "Metformin", "500mg", "8:00 AM", "Diabetes")];
        let prompt = build_insight_prompt(&meds, 75);
        assert!(prompt.contains("Metformin (500mg) at 8:00 AM - Status: Upcoming"));
        assert!(prompt.contains("Adherence Rate: 75%"));
    }
}
