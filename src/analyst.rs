use crate::error::PipelineError;
use crate::inference::{Inference, Message};
use crate::pipeline::StageAgent;
use crate::researcher::ResearchRecord;
use std::sync::Arc;

pub const AGENT_NAME: &str = "Analyst Agent";

#[derive(Debug, Clone)]
pub struct AnalysisRecord {
    pub agent: String,
    pub topic: String,
    pub analysis: String,
    /// The research text this analysis was produced from, echoed so the
    /// critic can review both without re-threading the research record.
    pub original_research: String,
}

pub struct AnalystAgent<C> {
    client: Arc<C>,
}

impl<C: Inference> AnalystAgent<C> {
    pub fn new(client: Arc<C>) -> Self {
        AnalystAgent { client }
    }
}

impl<C: Inference> StageAgent for AnalystAgent<C> {
    type Input = ResearchRecord;
    type Output = AnalysisRecord;

    async fn run(&self, input: ResearchRecord) -> Result<AnalysisRecord, PipelineError> {
        let prompt = format!(
            "You are an expert analyst. Analyze the following research on \"{topic}\":\n\n\
             {research}\n\n\
             Provide a detailed analysis including:\n\n\
             1. **Key Insights**: What are the most important takeaways?\n\
             2. **Strengths**: What aspects are well-covered and strong?\n\
             3. **Gaps**: What's missing or could be explored further?\n\
             4. **Implications**: What are the practical implications?\n\
             5. **Data Quality**: Assess the depth and breadth of the research\n\
             6. **Recommendations**: What actions or further research would you recommend?\n\n\
             Be critical, objective, and thorough.",
            topic = input.topic,
            research = input.research,
        );

        let messages = vec![
            Message::system(
                "You are an expert analytical agent specializing in research evaluation.",
            ),
            Message::user(prompt),
        ];

        let analysis = self.client.generate(messages, 0.4, 2048, false).await?;

        Ok(AnalysisRecord {
            agent: AGENT_NAME.to_string(),
            topic: input.topic,
            analysis,
            original_research: input.research,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::testing::ScriptedInference;
    use crate::researcher::Depth;

    fn research_record(topic: &str, research: &str) -> ResearchRecord {
        ResearchRecord {
            agent: crate::researcher::AGENT_NAME.to_string(),
            topic: topic.to_string(),
            research: research.to_string(),
            depth: Depth::Comprehensive,
        }
    }

    #[tokio::test]
    async fn test_full_research_embedded_in_prompt() {
        let research = "r".repeat(5000);
        let client = Arc::new(ScriptedInference::new().reply("analysis"));
        let agent = AnalystAgent::new(client.clone());
        agent
            .run(research_record("Fusion Energy", &research))
            .await
            .unwrap();

        let calls = client.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].temperature, 0.4);
        // The analyst sees the research verbatim, untruncated.
        assert!(calls[0].messages[1].content.contains(&research));
    }

    #[tokio::test]
    async fn test_record_echoes_original_research() {
        let client = Arc::new(ScriptedInference::new().reply("analysis"));
        let agent = AnalystAgent::new(client);
        let record = agent
            .run(research_record("Fusion Energy", "the findings"))
            .await
            .unwrap();

        assert_eq!(record.agent, AGENT_NAME);
        assert_eq!(record.topic, "Fusion Energy");
        assert_eq!(record.analysis, "analysis");
        assert_eq!(record.original_research, "the findings");
    }
}
