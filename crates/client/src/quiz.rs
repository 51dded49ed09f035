//! Quiz progression over a fetched question list.
//!
//! Pure state machine, no I/O:
//! `Idle -> Answering(i) -> Feedback(i) -> Answering(i+1) | Completed`.
//! Submitting is one-way; a question cannot be re-answered.

use shared::types::QuizQuestion;

/// Where the runner is in the question list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuizPhase {
    /// No questions loaded.
    #[default]
    Idle,
    /// Question `i` is shown, awaiting an answer.
    Answering(usize),
    /// Question `i` was answered; correctness and explanation are shown.
    Feedback(usize),
    /// Every question was answered; the final score is available.
    Completed,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuizRunner {
    questions: Vec<QuizQuestion>,
    phase: QuizPhase,
    selected: String,
    score: u32,
}

impl QuizRunner {
    /// Start over with a fresh question list. An empty list stays idle.
    pub fn begin(questions: Vec<QuizQuestion>) -> Self {
        let phase = if questions.is_empty() {
            QuizPhase::Idle
        } else {
            QuizPhase::Answering(0)
        };
        Self {
            questions,
            phase,
            selected: String::new(),
            score: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn is_completed(&self) -> bool {
        self.phase == QuizPhase::Completed
    }

    pub fn selected(&self) -> &str {
        &self.selected
    }

    /// The question currently shown, in either the answering or feedback
    /// phase.
    pub fn current_question(&self) -> Option<&QuizQuestion> {
        match self.phase {
            QuizPhase::Answering(i) | QuizPhase::Feedback(i) => self.questions.get(i),
            _ => None,
        }
    }

    /// Pick an answer for the current question. Ignored outside the
    /// answering phase, so feedback cannot be tampered with.
    pub fn select(&mut self, answer: &str) {
        if matches!(self.phase, QuizPhase::Answering(_)) {
            self.selected = answer.to_string();
        }
    }

    /// Lock in the selected answer. Requires a non-empty selection; scores
    /// by exact match against the question's correct answer. One-way.
    pub fn submit(&mut self) {
        let QuizPhase::Answering(i) = self.phase else {
            return;
        };
        if self.selected.is_empty() {
            return;
        }
        if self
            .questions
            .get(i)
            .is_some_and(|q| q.correct_answer == self.selected)
        {
            self.score += 1;
        }
        self.phase = QuizPhase::Feedback(i);
    }

    /// Whether the submitted answer was right. Only meaningful in feedback.
    pub fn answer_was_correct(&self) -> Option<bool> {
        match self.phase {
            QuizPhase::Feedback(i) => self
                .questions
                .get(i)
                .map(|q| q.correct_answer == self.selected),
            _ => None,
        }
    }

    /// Move past the feedback: next question, or completion after the last.
    pub fn advance(&mut self) {
        let QuizPhase::Feedback(i) = self.phase else {
            return;
        };
        self.selected.clear();
        self.phase = if i + 1 < self.questions.len() {
            QuizPhase::Answering(i + 1)
        } else {
            QuizPhase::Completed
        };
    }

    /// Drop the quiz without affecting anything else.
    pub fn discard(&mut self) {
        self.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(text: &str, correct: &str) -> QuizQuestion {
        QuizQuestion {
            question: text.to_string(),
            options: vec!["A".into(), "B".into(), "C".into(), correct.to_string()],
            correct_answer: correct.to_string(),
            explanation: format!("because {correct}"),
        }
    }

    #[test]
    fn empty_list_stays_idle() {
        let runner = QuizRunner::begin(Vec::new());
        assert_eq!(runner.phase(), QuizPhase::Idle);
        assert!(runner.current_question().is_none());
    }

    #[test]
    fn walks_answering_feedback_to_completion() {
        let mut runner = QuizRunner::begin(vec![question("q1", "x"), question("q2", "y")]);
        assert_eq!(runner.phase(), QuizPhase::Answering(0));

        runner.select("x");
        runner.submit();
        assert_eq!(runner.phase(), QuizPhase::Feedback(0));
        assert_eq!(runner.answer_was_correct(), Some(true));

        runner.advance();
        assert_eq!(runner.phase(), QuizPhase::Answering(1));
        assert!(runner.selected().is_empty());

        runner.select("wrong");
        runner.submit();
        assert_eq!(runner.answer_was_correct(), Some(false));

        runner.advance();
        assert_eq!(runner.phase(), QuizPhase::Completed);
        assert_eq!(runner.score(), 1);
    }

    #[test]
    fn score_counts_exact_matches_for_all_answer_patterns() {
        let questions = vec![question("q1", "a"), question("q2", "b"), question("q3", "c")];
        // Every subset of correct answers yields exactly that subset's size.
        for mask in 0..8u8 {
            let mut runner = QuizRunner::begin(questions.clone());
            let mut expected = 0;
            for (i, q) in questions.iter().enumerate() {
                if mask & (1 << i) != 0 {
                    runner.select(&q.correct_answer);
                    expected += 1;
                } else {
                    runner.select("nope");
                }
                runner.submit();
                runner.advance();
            }
            assert!(runner.is_completed());
            assert_eq!(runner.score(), expected, "mask {mask:#b}");
        }
    }

    #[test]
    fn submit_requires_a_selection() {
        let mut runner = QuizRunner::begin(vec![question("q1", "x")]);
        runner.submit();
        assert_eq!(runner.phase(), QuizPhase::Answering(0));
    }

    #[test]
    fn submission_is_one_way() {
        let mut runner = QuizRunner::begin(vec![question("q1", "x")]);
        runner.select("wrong");
        runner.submit();

        // Changing the selection during feedback does nothing.
        runner.select("x");
        assert_eq!(runner.selected(), "wrong");
        assert_eq!(runner.answer_was_correct(), Some(false));

        // Submitting again does not double-count or move the phase.
        runner.submit();
        assert_eq!(runner.phase(), QuizPhase::Feedback(0));
        assert_eq!(runner.score(), 0);
    }

    #[test]
    fn discard_returns_to_idle() {
        let mut runner = QuizRunner::begin(vec![question("q1", "x")]);
        runner.select("x");
        runner.submit();
        runner.advance();
        assert!(runner.is_completed());

        runner.discard();
        assert_eq!(runner.phase(), QuizPhase::Idle);
        assert_eq!(runner.score(), 0);
    }
}
