#[derive(Debug, Clone)]
pub struct DeliberationStep {
    pub step: u32,
    pub name: String,
    pub worker: String,
    pub output: String,
    pub duration_ms: u64,
}

#[derive(Debug, Clone)]
pub struct DeliberationResult {
    pub steps: Vec<DeliberationStep>,
    pub final_answer: String,
    pub confidence: f64,
}

impl DeliberationResult {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            steps: Vec::new(),
            final_answer: message.into(),
            confidence: 0.0,
        }
    }
}
