use crate::analyst::AnalystAgent;
use crate::config::Config;
use crate::critic::CriticAgent;
use crate::error::PipelineError;
use crate::inference::Inference;
use crate::parse::MediaSuggestion;
use crate::progress;
use crate::report;
use crate::researcher::{Depth, ResearchAgent, ResearchRequest};
use crate::synthesizer::{SynthesisInput, SynthesizerAgent};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One step of the pipeline: consume a typed input record, make one
/// inference call, produce a typed output record. Agents carry no state
/// beyond the injected client and their configured windows.
pub trait StageAgent {
    type Input;
    type Output;

    fn run(
        &self,
        input: Self::Input,
    ) -> impl Future<Output = Result<Self::Output, PipelineError>> + Send;
}

/// Uniform view of one stage's output, in pipeline order.
#[derive(Debug, Clone)]
pub struct StageRecord {
    pub name: String,
    pub agent: String,
    pub topic: String,
    pub output: String,
}

#[derive(Debug)]
pub struct PipelineResult {
    pub topic: String,
    pub stages: Vec<StageRecord>,
    pub total_time: Duration,
    pub final_report: String,
    pub media: Option<Vec<MediaSuggestion>>,
    pub report_path: Option<PathBuf>,
}

/// Sequences the four agents: Research → Analysis → Critique → Synthesis.
/// Strictly linear; each transition is gated only by the prior stage
/// succeeding, and any failure aborts the whole run.
pub struct Pipeline<C> {
    researcher: ResearchAgent<C>,
    analyst: AnalystAgent<C>,
    critic: CriticAgent<C>,
    synthesizer: SynthesizerAgent<C>,
    output_dir: PathBuf,
}

impl<C: Inference> Pipeline<C> {
    pub fn new(client: Arc<C>, config: &Config) -> Self {
        Pipeline {
            researcher: ResearchAgent::new(client.clone()),
            analyst: AnalystAgent::new(client.clone()),
            critic: CriticAgent::new(client.clone(), config.limits.critic_research_window),
            synthesizer: SynthesizerAgent::new(client, config.limits.synthesis_window),
            output_dir: config.server.output_dir.clone(),
        }
    }

    /// The research agent also serves requests outside the pipeline
    /// (related topics).
    pub fn researcher(&self) -> &ResearchAgent<C> {
        &self.researcher
    }

    /// Runs all four stages for `topic` and persists the final report.
    ///
    /// `total_time` covers the four mandatory stages only; the optional
    /// media branch runs after the clock stops.
    pub async fn run(
        &self,
        topic: &str,
        depth: Depth,
        include_media: bool,
    ) -> Result<PipelineResult, PipelineError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(PipelineError::Validation("Topic is required".to_string()));
        }

        let started = Instant::now();

        eprintln!("[Pipeline] Stage 1: Researching '{topic}' with {depth} depth...");
        progress::log_with(progress::Kind::Research, format!("researching '{topic}'"));
        let research = self
            .researcher
            .run(ResearchRequest {
                topic: topic.to_string(),
                depth,
            })
            .await?;

        eprintln!("[Pipeline] Stage 2: Analyzing research...");
        progress::log_with(progress::Kind::Analysis, "analyzing research");
        let analysis = self.analyst.run(research.clone()).await?;

        eprintln!("[Pipeline] Stage 3: Critical review...");
        progress::log_with(progress::Kind::Critique, "reviewing analysis");
        let critique = self.critic.run(analysis.clone()).await?;

        eprintln!("[Pipeline] Stage 4: Synthesizing final report...");
        progress::log_with(progress::Kind::Synthesis, "synthesizing report");
        let synthesis = self
            .synthesizer
            .run(SynthesisInput {
                research: research.clone(),
                analysis: analysis.clone(),
                critique: critique.clone(),
            })
            .await?;

        let total_time = started.elapsed();

        let media = if include_media {
            eprintln!("[Pipeline] Generating media suggestions...");
            Some(self.researcher.generate_media_suggestions(topic).await?)
        } else {
            None
        };

        let stages = vec![
            StageRecord {
                name: "Research".to_string(),
                agent: research.agent.clone(),
                topic: research.topic.clone(),
                output: research.research.clone(),
            },
            StageRecord {
                name: "Analysis".to_string(),
                agent: analysis.agent.clone(),
                topic: analysis.topic.clone(),
                output: analysis.analysis.clone(),
            },
            StageRecord {
                name: "Critique".to_string(),
                agent: critique.agent.clone(),
                topic: critique.topic.clone(),
                output: critique.critique.clone(),
            },
            StageRecord {
                name: "Synthesis".to_string(),
                agent: synthesis.agent.clone(),
                topic: synthesis.topic.clone(),
                output: synthesis.final_report.clone(),
            },
        ];

        let report_path = report::save_report(
            &self.output_dir,
            topic,
            depth,
            total_time,
            &synthesis.timestamp,
            &synthesis.final_report,
        )?;

        eprintln!(
            "[Pipeline] Complete. Total time: {:.2}s",
            total_time.as_secs_f64()
        );

        Ok(PipelineResult {
            topic: topic.to_string(),
            stages,
            total_time,
            final_report: synthesis.final_report,
            media,
            report_path: Some(report_path),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::testing::ScriptedInference;
    use std::fs;

    fn config_with_output(dir: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.server.output_dir = dir.to_path_buf();
        config
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "quartet-pipeline-test-{name}-{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn four_stage_client() -> ScriptedInference {
        ScriptedInference::new()
            .reply("research text")
            .reply("analysis text")
            .reply("critique text")
            .reply("final report text")
    }

    #[tokio::test]
    async fn test_successful_run_has_four_ordered_stages() {
        let dir = temp_dir("order");
        let client = Arc::new(four_stage_client());
        let pipeline = Pipeline::new(client.clone(), &config_with_output(&dir));

        let result = pipeline
            .run("Quantum Computing", Depth::Quick, false)
            .await
            .unwrap();

        let names: Vec<&str> = result.stages.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Research", "Analysis", "Critique", "Synthesis"]);
        for stage in &result.stages {
            assert_eq!(stage.topic, "Quantum Computing");
        }
        assert_eq!(result.final_report, "final report text");
        assert_eq!(client.calls().len(), 4);
        assert!(result.media.is_none());

        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_quick_depth_uses_2048_token_cap() {
        let dir = temp_dir("quick");
        let client = Arc::new(four_stage_client());
        let pipeline = Pipeline::new(client.clone(), &config_with_output(&dir));

        pipeline
            .run("Quantum Computing", Depth::Quick, false)
            .await
            .unwrap();
        assert_eq!(client.calls()[0].max_tokens, 2048);

        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_deep_depth_uses_3000_token_cap() {
        let dir = temp_dir("deep");
        let client = Arc::new(four_stage_client());
        let pipeline = Pipeline::new(client.clone(), &config_with_output(&dir));

        pipeline
            .run("Quantum Computing", Depth::Deep, false)
            .await
            .unwrap();
        assert_eq!(client.calls()[0].max_tokens, 3000);

        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_first_stage_failure_aborts_before_later_stages() {
        let dir = temp_dir("fail-first");
        let client = Arc::new(ScriptedInference::new().fail("boom"));
        let pipeline = Pipeline::new(client.clone(), &config_with_output(&dir));

        let err = pipeline
            .run("Quantum Computing", Depth::Comprehensive, false)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Inference(_)));
        assert_eq!(client.calls().len(), 1);
        // No partial report is ever written.
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_mid_pipeline_failure_stops_at_failing_stage() {
        let dir = temp_dir("fail-mid");
        let client = Arc::new(
            ScriptedInference::new()
                .reply("research text")
                .reply("analysis text")
                .fail("boom"),
        );
        let pipeline = Pipeline::new(client.clone(), &config_with_output(&dir));

        let err = pipeline
            .run("Quantum Computing", Depth::Comprehensive, false)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Inference(_)));
        assert_eq!(client.calls().len(), 3);
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_empty_topic_rejected_before_any_stage() {
        let dir = temp_dir("empty");
        let client = Arc::new(four_stage_client());
        let pipeline = Pipeline::new(client.clone(), &config_with_output(&dir));

        for topic in ["", "   "] {
            let err = pipeline
                .run(topic, Depth::Comprehensive, false)
                .await
                .unwrap_err();
            assert!(matches!(err, PipelineError::Validation(_)));
        }
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_media_branch_runs_after_synthesis() {
        let dir = temp_dir("media");
        let client = Arc::new(four_stage_client().reply(
            "TYPE: image\nTITLE: T\nDESCRIPTION: D\nSEARCH_QUERY: q\n",
        ));
        let pipeline = Pipeline::new(client.clone(), &config_with_output(&dir));

        let result = pipeline
            .run("Quantum Computing", Depth::Comprehensive, true)
            .await
            .unwrap();

        let media = result.media.unwrap();
        assert_eq!(media.len(), 1);
        assert_eq!(media[0].title, "T");
        // Four stage calls plus the topic-only media call.
        assert_eq!(client.calls().len(), 5);

        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_report_written_on_success() {
        let dir = temp_dir("report");
        let client = Arc::new(four_stage_client());
        let pipeline = Pipeline::new(client, &config_with_output(&dir));

        let result = pipeline
            .run("Quantum Computing", Depth::Comprehensive, false)
            .await
            .unwrap();

        let path = result.report_path.unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("final report text"));
        assert!(contents.contains("Research Depth: comprehensive"));

        let _ = fs::remove_dir_all(&dir);
    }
}
