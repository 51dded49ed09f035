//! StudyDesk terminal shell.
//!
//! A thin line-oriented driver over the client controllers. All the real
//! behavior (token lifecycle, session lifecycle, quiz/flashcard/chat state)
//! lives in the `client` and `gateway` crates; this binary only renders
//! snapshots and forwards commands.

use anyhow::Result;
use chrono::NaiveDate;
use client::auth::AuthController;
use client::plan::PlanController;
use client::quiz::QuizPhase;
use client::session::{StudyController, StudyState};
use gateway::{CredentialStore, Download, Gateway};
use shared::config::ClientConfig;
use shared::types::{SessionId, Sender};
use std::io::{self, BufRead, Write};
use std::sync::Arc;

const HELP: &str = "\
Commands:
  login <user> <pass>      sign in
  register <user> <pass>   create an account (then log in)
  logout                   sign out (local only)
  topic <text>             generate notes for a topic
  show                     print the active session
  history                  list saved sessions
  load <id>                load a saved session
  delete <id>              delete a saved session
  quiz                     generate a quiz from the notes
  pick <n>                 choose option n for the current question
  submit                   lock in the chosen answer
  next                     advance past the feedback
  discard                  drop the quiz, keep the notes
  cards                    generate flashcards from the notes
  flip | fwd | back        browse the flashcards
  chat <text>              ask about the notes
  plan                     list scheduled reviews
  plan add <YYYY-MM-DD>    schedule the current topic for review
  plan rm <id>             remove a scheduled review
  pdf                      download the notes as PDF
  csv                      download the flashcards as CSV
  help, quit";

struct Shell {
    auth: Arc<AuthController>,
    study: Arc<StudyController>,
    plan: Arc<PlanController>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let config = ClientConfig::load();
    let credentials = Arc::new(CredentialStore::open());
    let gateway = Arc::new(Gateway::new(&config, credentials)?);

    let shell = Shell {
        auth: AuthController::new(gateway.clone()),
        study: StudyController::new(gateway.clone()),
        plan: PlanController::new(gateway.clone()),
    };

    println!("StudyDesk (backend: {})", config.base_url);

    // Boot-time token check. Only once `is_loading` drops may "no user"
    // be read as "signed out".
    shell.auth.bootstrap().await;
    if shell.auth.is_authenticated() {
        let user = shell.auth.user().expect("authenticated implies a user");
        println!("Signed in as {}.", user.username);
        shell.study.refresh_history().await;
        shell.plan.refresh().await;
    } else {
        println!("Not signed in. `login <user> <pass>` to begin, `help` for commands.");
    }

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "quit" | "exit") {
            break;
        }
        shell.dispatch(line).await;
    }
    Ok(())
}

impl Shell {
    async fn dispatch(&self, line: &str) {
        let (command, rest) = match line.split_once(' ') {
            Some((c, r)) => (c, r.trim()),
            None => (line, ""),
        };

        match command {
            "help" => println!("{HELP}"),
            "login" => self.login(rest).await,
            "register" => self.register(rest).await,
            "logout" => {
                self.auth.logout();
                self.study.clear();
                self.plan.clear();
                println!("Signed out.");
            }
            _ if !self.auth.is_authenticated() => {
                println!("Sign in first (`login <user> <pass>`).");
            }
            "topic" => {
                if let Err(err) = self.study.fetch_and_enter_topic(rest).await {
                    println!("Could not fetch content: {}", err.message());
                } else {
                    self.print_session();
                }
            }
            "show" => self.print_session(),
            "history" => self.print_history().await,
            "load" => match self.study.load_session(&SessionId::from(rest)).await {
                Ok(()) => self.print_session(),
                Err(err) => println!("Could not load session: {}", err.message()),
            },
            "delete" => match self.study.delete_session(&SessionId::from(rest)).await {
                Ok(()) => println!("Deleted."),
                Err(err) => println!("Could not delete session: {}", err.message()),
            },
            "quiz" => match self.study.regenerate_quiz().await {
                Ok(()) => self.print_question(),
                Err(err) => println!("Quiz: {}", err.message()),
            },
            "pick" => {
                let state = self.study.snapshot();
                let options = state
                    .quiz
                    .current_question()
                    .map(|q| q.options.clone())
                    .unwrap_or_default();
                match rest
                    .parse::<usize>()
                    .ok()
                    .filter(|n| *n >= 1)
                    .and_then(|n| options.get(n - 1).cloned())
                {
                    Some(option) => {
                        self.study.select_answer(&option);
                        println!("Picked: {option}");
                    }
                    None => println!("No such option."),
                }
            }
            "submit" => {
                self.study.submit_answer();
                self.print_question();
            }
            "next" => {
                self.study.next_question();
                self.print_question();
            }
            "discard" => {
                self.study.discard_quiz();
                println!("Quiz discarded.");
            }
            "cards" => match self.study.regenerate_flashcards().await {
                Ok(()) => {
                    let state = self.study.snapshot();
                    match state.cards_notice {
                        Some(notice) => println!("{notice}"),
                        None => self.print_card(),
                    }
                }
                Err(err) => println!("Flashcards: {}", err.message()),
            },
            "flip" => {
                self.study.flip_card();
                self.print_card();
            }
            "fwd" => {
                self.study.next_card();
                self.print_card();
            }
            "back" => {
                self.study.prev_card();
                self.print_card();
            }
            "chat" => {
                // Failures land in the thread as synthetic entries, so the
                // tail shows them either way.
                let _ = self.study.send_chat(rest).await;
                self.print_last_exchange();
            }
            "plan" => self.plan_command(rest).await,
            "pdf" => match self.study.export_pdf().await {
                Ok(download) => save_download(download, "notes.pdf"),
                Err(err) => println!("PDF export: {}", err.message()),
            },
            "csv" => match self.study.export_flashcards_csv().await {
                Ok(download) => save_download(download, "flashcards.csv"),
                Err(err) => println!("CSV export: {}", err.message()),
            },
            other => println!("Unknown command `{other}`; try `help`."),
        }
    }

    async fn login(&self, rest: &str) {
        let Some((user, pass)) = rest.split_once(' ') else {
            println!("Usage: login <user> <pass>");
            return;
        };
        match self.auth.login(user.trim(), pass.trim()).await {
            Ok(()) => {
                println!("Signed in as {user}.");
                self.study.refresh_history().await;
                self.plan.refresh().await;
            }
            Err(err) => println!("Login failed: {}", err.message()),
        }
    }

    async fn register(&self, rest: &str) {
        let Some((user, pass)) = rest.split_once(' ') else {
            println!("Usage: register <user> <pass>");
            return;
        };
        match self.auth.register(user.trim(), pass.trim()).await {
            Ok(()) => println!("Registered. Now `login {user} <pass>`."),
            Err(err) => println!("Registration failed: {}", err.message()),
        }
    }

    async fn plan_command(&self, rest: &str) {
        let (sub, arg) = match rest.split_once(' ') {
            Some((s, a)) => (s, a.trim()),
            None => (rest, ""),
        };
        match sub {
            "" => {
                self.plan.refresh().await;
                let state = self.plan.snapshot();
                if let Some(err) = state.error {
                    println!("Study plan: {err}");
                    return;
                }
                if state.entries.is_empty() {
                    println!("No scheduled reviews.");
                }
                for entry in state.entries {
                    println!("  [{}] {} on {}", entry.id, entry.topic, entry.review_date);
                }
            }
            "add" => {
                let Ok(date) = arg.parse::<NaiveDate>() else {
                    println!("Usage: plan add <YYYY-MM-DD>");
                    return;
                };
                let topic = self.study.snapshot().session.topic;
                match self.plan.add(&topic, date).await {
                    Ok(()) => println!("Scheduled {topic} for {date}."),
                    Err(err) => println!("Study plan: {}", err.message()),
                }
            }
            "rm" => {
                let Ok(id) = arg.parse::<i64>() else {
                    println!("Usage: plan rm <id>");
                    return;
                };
                match self.plan.remove(id).await {
                    Ok(()) => println!("Removed."),
                    Err(err) => println!("Study plan: {}", err.message()),
                }
            }
            _ => println!("Usage: plan | plan add <YYYY-MM-DD> | plan rm <id>"),
        }
    }

    fn print_session(&self) {
        let state = self.study.snapshot();
        if let Some(err) = &state.content_error {
            println!("Error: {err}");
        }
        if state.session.notes.is_empty() {
            println!("No active session. `topic <text>` to start one.");
            return;
        }
        match &state.session.id {
            Some(id) => println!("# {} (session {id})", state.session.topic),
            None => println!("# {} (not saved)", state.session.topic),
        }
        println!("\n{}\n", state.session.notes);
        if !state.session.summary.is_empty() {
            println!("Summary: {}\n", state.session.summary);
        }
        for video in &state.session.videos {
            println!("  video: {} <{}>", video.title, video.url);
        }
    }

    async fn print_history(&self) {
        self.study.refresh_history().await;
        let state = self.study.snapshot();
        if let Some(err) = state.history_error {
            println!("History: {err}");
            return;
        }
        if state.history.is_empty() {
            println!("No saved sessions.");
        }
        for entry in state.history {
            println!(
                "  [{}] {} ({})",
                entry.id,
                entry.topic,
                entry.created_at.format("%Y-%m-%d")
            );
        }
    }

    fn print_question(&self) {
        let state = self.study.snapshot();
        match state.quiz.phase() {
            QuizPhase::Idle => println!("No quiz. `quiz` to generate one."),
            QuizPhase::Answering(i) => {
                let q = state.quiz.current_question().expect("question in range");
                println!("Question {} of {}: {}", i + 1, state.quiz.len(), q.question);
                for (n, option) in q.options.iter().enumerate() {
                    println!("  {}) {option}", n + 1);
                }
                println!("`pick <n>` then `submit`.");
            }
            QuizPhase::Feedback(_) => {
                let q = state.quiz.current_question().expect("question in range");
                if state.quiz.answer_was_correct() == Some(true) {
                    println!("Correct!");
                } else {
                    println!("Incorrect. The answer was: {}", q.correct_answer);
                }
                if !q.explanation.is_empty() {
                    println!("{}", q.explanation);
                }
                println!("`next` to continue.");
            }
            QuizPhase::Completed => {
                println!(
                    "Quiz completed! Score: {} / {}. `quiz` regenerates, `discard` returns to notes.",
                    state.quiz.score(),
                    state.quiz.len()
                );
            }
        }
    }

    fn print_card(&self) {
        let state = self.study.snapshot();
        let Some(card) = state.cards.current() else {
            println!("No flashcards. `cards` to generate some.");
            return;
        };
        let side = if state.cards.is_flipped() {
            &card.definition
        } else {
            &card.term
        };
        println!(
            "[{}/{}] {side}",
            state.cards.index() + 1,
            state.cards.len()
        );
    }

    fn print_last_exchange(&self) {
        let state = self.study.snapshot();
        if let Some(err) = &state.chat_error {
            println!("Chat: {err}");
        }
        print_thread_tail(&state, 2);
    }
}

fn print_thread_tail(state: &StudyState, count: usize) {
    let messages = state.chat.messages();
    let start = messages.len().saturating_sub(count);
    for message in &messages[start..] {
        let who = match message.sender {
            Sender::User => "you",
            Sender::Ai => "studydesk",
        };
        println!("{who}: {}", message.text);
    }
}

fn save_download(download: Download, fallback: &str) {
    let name = download.filename.unwrap_or_else(|| fallback.to_string());
    match std::fs::write(&name, &download.bytes) {
        Ok(()) => println!("Saved {name} ({} bytes).", download.bytes.len()),
        Err(err) => println!("Could not write {name}: {err}"),
    }
}
