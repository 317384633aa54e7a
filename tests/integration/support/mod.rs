use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use anyhow::Result;
use researchintake::analysis::SimilarityStrategy;
use researchintake::chat::{UserPrompt, UserReply};
use researchintake::orchestration::{CancellationToken, Sleeper};
use researchintake::proposers::{ProposerError, TextProposer};

pub const LAPTOP_QUERY: &str = "Recommend a laptop for work within budget";

pub const DETAILED_ANSWERS: [&str; 3] = [
    "I am a graduate student who writes code all day and often commutes between the lab and the library on campus",
    "Mostly programming in large IDEs with several virtual machines running at once plus the occasional video call with my advisor",
    "I would like to keep the total spend under about one thousand dollars including tax and a protective sleeve",
];

#[derive(Default)]
struct ScriptState {
    replies: VecDeque<Result<String, ProposerError>>,
    prompts: Vec<String>,
}

/// Replays canned proposer replies; an empty script means "unavailable".
#[derive(Clone, Default)]
pub struct ScriptedProposer {
    state: Rc<RefCell<ScriptState>>,
}

impl ScriptedProposer {
    pub fn new<I>(replies: I) -> Self
    where
        I: IntoIterator<Item = Result<String, ProposerError>>,
    {
        let proposer = Self::default();
        proposer.state.borrow_mut().replies = replies.into_iter().collect();
        proposer
    }

    pub fn questions(questions: &[&str]) -> Self {
        Self::new(questions.iter().map(|q| Ok(q.to_string())))
    }

    pub fn calls(&self) -> usize {
        self.state.borrow().prompts.len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.state.borrow().prompts.clone()
    }
}

impl TextProposer for ScriptedProposer {
    fn name(&self) -> &str {
        "scripted"
    }

    fn propose(&self, prompt: &str) -> Result<String, ProposerError> {
        let mut state = self.state.borrow_mut();
        state.prompts.push(prompt.to_string());
        state
            .replies
            .pop_front()
            .unwrap_or_else(|| Err(ProposerError::Unavailable("script exhausted".into())))
    }
}

/// Fails every call with the same error and counts the calls.
#[derive(Clone)]
pub struct FailingProposer {
    error: ProposerError,
    calls: Rc<RefCell<usize>>,
}

impl FailingProposer {
    pub fn new(error: ProposerError) -> Self {
        Self {
            error,
            calls: Rc::new(RefCell::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.borrow()
    }
}

impl TextProposer for FailingProposer {
    fn name(&self) -> &str {
        "failing"
    }

    fn propose(&self, _prompt: &str) -> Result<String, ProposerError> {
        *self.calls.borrow_mut() += 1;
        Err(self.error.clone())
    }
}

#[derive(Clone, Default)]
pub struct RecordingSleeper {
    slept: Rc<RefCell<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn slept(&self) -> Vec<Duration> {
        self.slept.borrow().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.slept.borrow_mut().push(duration);
    }
}

/// Treats nothing as similar; only verbatim repeats are filtered.
pub struct NeverSimilar;

impl SimilarityStrategy for NeverSimilar {
    fn is_similar(&self, _candidate: &str, _asked: &[&str], _turn_count: usize) -> bool {
        false
    }
}

/// Answers from a fixed list and then cancels.
#[derive(Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<String>,
    pub asked: Vec<String>,
    pub notices: Vec<String>,
    cancel_on_ask: Option<(usize, CancellationToken)>,
}

impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Fires `token` while the `ask_number`-th question (1-based) is pending.
    pub fn cancel_on_ask(mut self, ask_number: usize, token: CancellationToken) -> Self {
        self.cancel_on_ask = Some((ask_number, token));
        self
    }
}

impl UserPrompt for ScriptedPrompt {
    fn ask(&mut self, question: &str) -> Result<UserReply> {
        self.asked.push(question.to_string());
        if let Some((ask_number, token)) = &self.cancel_on_ask {
            if *ask_number == self.asked.len() {
                token.cancel();
            }
        }
        Ok(match self.answers.pop_front() {
            Some(answer) => UserReply::Answer(answer),
            None => UserReply::Cancelled,
        })
    }

    fn notify(&mut self, message: &str) -> Result<()> {
        self.notices.push(message.to_string());
        Ok(())
    }
}
