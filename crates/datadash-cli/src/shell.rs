// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::render;
use crate::runtime::{Runtime, RuntimeEvent};
use anyhow::{Context, Result, anyhow, bail};
use datadash_app::{
    AppCommand, AppController, AppEvent, KeywordCardFields, NavView, Session, Theme, TodoId,
    ViewMode,
};
use datadash_ingest::{DecodeOptions, decode_file};
use std::cell::RefCell;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::rc::Rc;
use tracing::debug;

pub const HELP: &str = "\
Commands:
  show                 Show the current page
  filter <text>        Keep rows containing <text> (empty clears)
  sort <column>        Sort by column; repeat to flip direction
  page <n>             Jump to page n
  next | prev          Move one page
  view table|grid      Switch between table and product cards
  analyze              Ask the model for an analysis of the data
  ask <question>       Follow-up question about the analysis
  todo add <text>      Add an action item
  todo toggle <id>     Mark an action item done or open
  todo rm <id>         Remove an action item
  todos                List action items
  context [path]       Print (or write) the agent context JSON
  load <file>          Load a CSV or Excel file
  reset                Drop the loaded file and everything derived from it
  theme [light|dark]   Toggle or set the theme
  nav <view>           dashboard, inventory, orders, customers, settings
  nav next | nav prev  Cycle through the views
  help                 Show this help
  quit                 Leave
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Show,
    Filter(String),
    Sort(String),
    Page(usize),
    Next,
    Prev,
    View(ViewMode),
    Analyze,
    Ask(String),
    TodoAdd(String),
    TodoToggle(TodoId),
    TodoRemove(TodoId),
    Todos,
    Context(Option<PathBuf>),
    Load(PathBuf),
    Reset,
    Theme(Option<Theme>),
    Nav(NavView),
    NavNext,
    NavPrev,
    Help,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Blank lines parse to `None`.
pub fn parse_command(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word {
        "show" => Command::Show,
        "filter" => Command::Filter(rest.to_owned()),
        "sort" => Command::Sort(required(rest, "sort <column>")?.to_owned()),
        "page" => Command::Page(
            rest.parse()
                .map_err(|_| anyhow!("page expects a page number, got {rest:?}"))?,
        ),
        "next" => Command::Next,
        "prev" => Command::Prev,
        "view" => Command::View(
            ViewMode::parse(rest)
                .ok_or_else(|| anyhow!("view expects `table` or `grid`, got {rest:?}"))?,
        ),
        "analyze" => Command::Analyze,
        "ask" => Command::Ask(rest.to_owned()),
        "todo" => parse_todo(rest)?,
        "todos" => Command::Todos,
        "context" => Command::Context((!rest.is_empty()).then(|| PathBuf::from(rest))),
        "load" => Command::Load(PathBuf::from(required(rest, "load <file>")?)),
        "reset" => Command::Reset,
        "theme" if rest.is_empty() => Command::Theme(None),
        "theme" => Command::Theme(Some(
            Theme::parse(rest)
                .ok_or_else(|| anyhow!("theme expects `light` or `dark`, got {rest:?}"))?,
        )),
        "nav" if rest == "next" => Command::NavNext,
        "nav" if rest == "prev" => Command::NavPrev,
        "nav" => Command::Nav(NavView::parse(rest).ok_or_else(|| {
            let views: Vec<&str> = NavView::ALL.iter().map(|view| view.label()).collect();
            anyhow!("unknown view {rest:?}; choose one of: {}", views.join(", "))
        })?),
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => bail!("unknown command {other:?}; type `help` to list commands"),
    };
    Ok(Some(command))
}

fn parse_todo(rest: &str) -> Result<Command> {
    let (action, argument) = match rest.split_once(char::is_whitespace) {
        Some((action, argument)) => (action, argument.trim()),
        None => (rest, ""),
    };
    match action {
        "add" => Ok(Command::TodoAdd(argument.to_owned())),
        "toggle" => Ok(Command::TodoToggle(todo_id(argument)?)),
        "rm" | "remove" => Ok(Command::TodoRemove(todo_id(argument)?)),
        _ => bail!("usage: todo add <text> | todo toggle <id> | todo rm <id>"),
    }
}

fn todo_id(raw: &str) -> Result<TodoId> {
    raw.parse::<u64>()
        .map(TodoId::new)
        .map_err(|_| anyhow!("expected an action item number, got {raw:?}"))
}

fn required<'a>(value: &'a str, usage: &str) -> Result<&'a str> {
    if value.is_empty() {
        bail!("usage: {usage}");
    }
    Ok(value)
}

/// The interactive loop. Owns the session and the UI controller and writes
/// every rendering to `out`.
pub struct Shell<W: Write> {
    session: Session,
    controller: AppController,
    notices: Rc<RefCell<Vec<String>>>,
    runtime: Runtime,
    decode_options: DecodeOptions,
    cards: KeywordCardFields,
    out: W,
}

impl<W: Write> Shell<W> {
    pub fn new(
        session: Session,
        mut controller: AppController,
        runtime: Runtime,
        decode_options: DecodeOptions,
        out: W,
    ) -> Self {
        let notices = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&notices);
        controller.subscribe(move |event| match event {
            AppEvent::StatusUpdated(message) => sink.borrow_mut().push(message.clone()),
            AppEvent::ThemeChanged(theme) => debug!(theme = theme.as_str(), "theme changed"),
            AppEvent::NavChanged(view) => debug!(view = view.label(), "navigated"),
            AppEvent::StatusCleared => {}
        });

        Self {
            session,
            controller,
            notices,
            runtime,
            decode_options,
            cards: KeywordCardFields,
            out,
        }
    }

    #[cfg(test)]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[cfg(test)]
    pub fn controller(&self) -> &AppController {
        &self.controller
    }

    #[cfg(test)]
    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    #[cfg(test)]
    pub fn writer(&self) -> &W {
        &self.out
    }

    /// Reads events until input closes or the user quits.
    pub fn run(&mut self) -> Result<()> {
        writeln!(self.out, "{}", render::status_line(self.controller.state(), &self.session))?;
        writeln!(self.out, "Type `help` for commands.")?;
        self.prompt()?;

        while let Some(event) = self.runtime.next_event() {
            let is_input = matches!(event, RuntimeEvent::Input(_));
            if self.handle_event(event)? == Flow::Quit {
                break;
            }
            if is_input {
                self.prompt()?;
            }
        }
        Ok(())
    }

    pub fn handle_event(&mut self, event: RuntimeEvent) -> Result<Flow> {
        if let Some(request_id) = event.request_id() {
            debug!(request = %request_id, "worker reported back");
        }
        match event {
            RuntimeEvent::Input(line) => match self.execute(&line) {
                Ok(flow) => Ok(flow),
                Err(error) => {
                    writeln!(self.out, "error: {error:#}")?;
                    Ok(Flow::Continue)
                }
            },
            RuntimeEvent::InputClosed => Ok(Flow::Quit),
            RuntimeEvent::AnalysisFinished { request_id, result } => {
                if self.session.finish_analysis(request_id, result) {
                    match self.session.analysis() {
                        Some(analysis) => write!(self.out, "\n{}", render::analysis(analysis))?,
                        None => self.print_session_error()?,
                    }
                }
                Ok(Flow::Continue)
            }
            RuntimeEvent::ChatFinished { request_id, result } => {
                if self.session.finish_chat(request_id, result) {
                    match self.session.error() {
                        Some(_) => self.print_session_error()?,
                        None => {
                            let transcript = self.session.transcript();
                            let last = &transcript[transcript.len().saturating_sub(1)..];
                            write!(self.out, "{}", render::transcript(last))?;
                        }
                    }
                }
                Ok(Flow::Continue)
            }
        }
    }

    pub fn execute(&mut self, line: &str) -> Result<Flow> {
        let Some(command) = parse_command(line)? else {
            return Ok(Flow::Continue);
        };
        debug!(?command, "shell command");

        match command {
            Command::Show => self.show()?,
            Command::Filter(text) => {
                self.session.request_filter(text);
                self.show()?;
            }
            Command::Sort(column) => {
                let headers = &self.session.dataset().headers;
                if !headers.contains(&column) {
                    bail!(
                        "unknown column {column:?}; columns are: {}",
                        headers.join(", ")
                    );
                }
                self.session.request_sort(&column);
                self.show()?;
            }
            Command::Page(page) => {
                if !self.session.go_to_page(page) {
                    let count = self.session.view().page_count(self.session.dataset());
                    bail!("page {page} is out of range; pages run from 1 to {count}");
                }
                self.show()?;
            }
            Command::Next => {
                if self.session.next_page() {
                    self.show()?;
                } else {
                    writeln!(self.out, "Already on the last page.")?;
                }
            }
            Command::Prev => {
                if self.session.prev_page() {
                    self.show()?;
                } else {
                    writeln!(self.out, "Already on the first page.")?;
                }
            }
            Command::View(mode) => {
                self.session.set_view_mode(mode);
                self.show()?;
            }
            Command::Analyze => {
                let request_id = self.session.begin_analysis()?;
                self.runtime
                    .spawn_analysis(request_id, self.session.dataset().clone());
                writeln!(self.out, "Analyzing {}...", self.session.dataset().file_name)?;
            }
            Command::Ask(question) => {
                if let Some(request_id) = self.session.begin_chat(&question)? {
                    let analysis = self
                        .session
                        .analysis()
                        .cloned()
                        .ok_or_else(|| anyhow!("analysis vanished while starting a chat"))?;
                    self.runtime.spawn_chat(
                        request_id,
                        self.session.dataset().clone(),
                        analysis,
                        self.session.transcript().to_vec(),
                    );
                    writeln!(self.out, "Thinking...")?;
                }
            }
            Command::TodoAdd(text) => {
                if let Some(id) = self.session.todos_mut().add(&text) {
                    writeln!(self.out, "Added action item {id}.")?;
                }
            }
            Command::TodoToggle(id) => {
                if !self.session.todos_mut().toggle(id) {
                    bail!("no action item {id}");
                }
                write!(self.out, "{}", render::todos(self.session.todos()))?;
            }
            Command::TodoRemove(id) => {
                if !self.session.todos_mut().remove(id) {
                    bail!("no action item {id}");
                }
                write!(self.out, "{}", render::todos(self.session.todos()))?;
            }
            Command::Todos => write!(self.out, "{}", render::todos(self.session.todos()))?,
            Command::Context(path) => {
                let json = self.session.context().to_pretty_json()?;
                match path {
                    Some(path) => {
                        fs::write(&path, json)
                            .with_context(|| format!("write context to {}", path.display()))?;
                        writeln!(self.out, "Wrote context to {}.", path.display())?;
                    }
                    None => writeln!(self.out, "{json}")?,
                }
            }
            Command::Load(path) => match decode_file(&path, self.decode_options) {
                Ok(dataset) => {
                    self.session.load_dataset(dataset);
                    self.show()?;
                }
                Err(error) => {
                    self.session.fail_load(error.to_string());
                    self.print_session_error()?;
                }
            },
            Command::Reset => {
                self.session.reset();
                writeln!(self.out, "Cleared. Load a file to start again.")?;
            }
            Command::Theme(choice) => {
                let command = choice.map_or(AppCommand::ToggleTheme, AppCommand::SetTheme);
                self.controller.dispatch(command);
            }
            Command::Nav(view) => self.navigate(AppCommand::Navigate(view))?,
            Command::NavNext => self.navigate(AppCommand::NextView)?,
            Command::NavPrev => self.navigate(AppCommand::PrevView)?,
            Command::Help => write!(self.out, "{HELP}")?,
            Command::Quit => return Ok(Flow::Quit),
        }

        self.flush_notices()?;
        Ok(Flow::Continue)
    }

    fn show(&mut self) -> Result<()> {
        writeln!(
            self.out,
            "{}",
            render::status_line(self.controller.state(), &self.session)
        )?;
        if let Some(error) = self.session.error() {
            writeln!(self.out, "error: {error}")?;
        }
        if !self.session.has_data() {
            writeln!(self.out, "No file loaded. Use `load <file>` to open a CSV or Excel file.")?;
            return Ok(());
        }

        let projection = self.session.project();
        let headers = &self.session.dataset().headers;
        let text = match self.session.view().mode() {
            ViewMode::Table => render::table(&projection, headers, self.session.view().sort()),
            ViewMode::Grid => render::grid(&projection, headers, &self.cards),
        };
        write!(self.out, "{text}")?;
        Ok(())
    }

    fn navigate(&mut self, command: AppCommand) -> Result<()> {
        self.controller.dispatch(command);
        if self.controller.state().nav == NavView::Dashboard {
            self.show()?;
        }
        Ok(())
    }

    fn print_session_error(&mut self) -> Result<()> {
        if let Some(error) = self.session.error() {
            writeln!(self.out, "error: {error}")?;
        }
        Ok(())
    }

    fn flush_notices(&mut self) -> Result<()> {
        let notices: Vec<String> = self.notices.borrow_mut().drain(..).collect();
        for notice in notices {
            writeln!(self.out, "* {notice}")?;
        }
        Ok(())
    }

    fn prompt(&mut self) -> Result<()> {
        write!(self.out, "> ")?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Command, Flow, Shell, parse_command};
    use crate::runtime::Runtime;
    use crate::runtime::tests::ScriptedAnalyst;
    use anyhow::{Result, anyhow};
    use datadash_app::{
        AppController, AppState, ChatMessage, NavView, PageSizes, PendingKind, Session, Theme,
        TodoId, ViewMode,
    };
    use datadash_ingest::DecodeOptions;
    use datadash_llm::Analyst;
    use datadash_testkit::{
        CatalogFaker, sample_analysis, stock_rows, temp_csv, temp_file_path, temp_text_file,
    };
    use serde_json::Value;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;

    fn shell_with(analyst: Arc<dyn Analyst>) -> Shell<Vec<u8>> {
        Shell::new(
            Session::new(PageSizes { table: 2, grid: 3 }, ViewMode::Table),
            AppController::new(AppState::default()),
            Runtime::new(analyst),
            DecodeOptions::default(),
            Vec::new(),
        )
    }

    fn output(shell: &Shell<Vec<u8>>) -> String {
        String::from_utf8_lossy(shell.writer()).into_owned()
    }

    fn pump(shell: &mut Shell<Vec<u8>>) -> Result<()> {
        let event = shell
            .runtime()
            .next_event_within(Duration::from_secs(5))
            .ok_or_else(|| anyhow!("worker never reported back"))?;
        shell.handle_event(event)?;
        Ok(())
    }

    fn loaded_shell(analyst: Arc<dyn Analyst>) -> Result<(tempfile::TempDir, Shell<Vec<u8>>)> {
        let (dir, path) = temp_csv(&stock_rows())?;
        let mut shell = shell_with(analyst);
        shell.execute(&format!("load {}", path.display()))?;
        Ok((dir, shell))
    }

    #[test]
    fn parses_commands_and_arguments() -> Result<()> {
        assert_eq!(parse_command("   ")?, None);
        assert_eq!(
            parse_command("sort product name")?,
            Some(Command::Sort("product name".to_owned()))
        );
        assert_eq!(parse_command("filter")?, Some(Command::Filter(String::new())));
        assert_eq!(parse_command("page 3")?, Some(Command::Page(3)));
        assert_eq!(parse_command("view grid")?, Some(Command::View(ViewMode::Grid)));
        assert_eq!(
            parse_command("todo toggle 2")?,
            Some(Command::TodoToggle(TodoId::new(2)))
        );
        assert_eq!(
            parse_command("todo add call the supplier")?,
            Some(Command::TodoAdd("call the supplier".to_owned()))
        );
        assert_eq!(parse_command("context")?, Some(Command::Context(None)));
        assert_eq!(
            parse_command("context out.json")?,
            Some(Command::Context(Some(PathBuf::from("out.json"))))
        );
        assert_eq!(parse_command("theme")?, Some(Command::Theme(None)));
        assert_eq!(
            parse_command("theme dark")?,
            Some(Command::Theme(Some(Theme::Dark)))
        );
        assert_eq!(
            parse_command("nav orders")?,
            Some(Command::Nav(NavView::Orders))
        );
        assert_eq!(parse_command("nav next")?, Some(Command::NavNext));
        assert_eq!(parse_command("nav prev")?, Some(Command::NavPrev));
        Ok(())
    }

    #[test]
    fn parse_errors_say_what_was_expected() {
        let page = parse_command("page two").expect_err("not a number");
        assert!(page.to_string().contains("page number"));

        let view = parse_command("view kanban").expect_err("unknown mode");
        assert!(view.to_string().contains("`table` or `grid`"));

        let nav = parse_command("nav reports").expect_err("unknown view");
        assert!(nav.to_string().contains("dashboard, inventory"));

        let unknown = parse_command("frobnicate").expect_err("unknown command");
        assert!(unknown.to_string().contains("help"));

        assert!(parse_command("sort").is_err());
        assert!(parse_command("todo toggle x").is_err());
    }

    #[test]
    fn load_sort_and_page_through_rows() -> Result<()> {
        let (_dir, mut shell) = loaded_shell(Arc::new(ScriptedAnalyst::default()))?;
        assert!(output(&shell).contains("Rows 1-2 of 3 | Page 1 of 2"));

        shell.execute("sort stock")?;
        shell.execute("next")?;
        let text = output(&shell);
        assert!(text.contains("Rows 3-3 of 3 | Page 2 of 2"));

        shell.execute("next")?;
        assert!(output(&shell).ends_with("Already on the last page.\n"));

        let err = shell.execute("page 9").expect_err("only two pages");
        assert!(err.to_string().contains("pages run from 1 to 2"));

        let err = shell.execute("sort price").expect_err("no such column");
        assert!(err.to_string().contains("columns are: name, stock"));
        Ok(())
    }

    #[test]
    fn filter_and_view_switch_return_to_the_first_page() -> Result<()> {
        let (_dir, mut shell) = loaded_shell(Arc::new(ScriptedAnalyst::default()))?;
        shell.execute("next")?;
        assert_eq!(shell.session().view().page(), 2);

        shell.execute("view grid")?;
        assert_eq!(shell.session().view().page(), 1);
        assert_eq!(shell.session().view().mode(), ViewMode::Grid);

        shell.execute("filter c")?;
        assert!(output(&shell).ends_with("Rows 1-1 of 1 | Page 1 of 1 (filtered from 3)\n"));
        Ok(())
    }

    #[test]
    fn analysis_then_follow_up_question() -> Result<()> {
        let analyst = Arc::new(ScriptedAnalyst::answering(
            sample_analysis(),
            "C has the least stock.",
        ));
        let (_dir, mut shell) = loaded_shell(analyst.clone())?;

        shell.execute("analyze")?;
        assert_eq!(shell.session().pending(), Some(PendingKind::Analysis));
        pump(&mut shell)?;
        assert_eq!(shell.session().analysis(), Some(&sample_analysis()));
        assert!(output(&shell).contains("Key Insights & Trends"));

        shell.execute("ask which item is lowest?")?;
        pump(&mut shell)?;
        assert!(output(&shell).ends_with("ai> C has the least stock.\n"));
        assert_eq!(
            shell.session().transcript(),
            &[
                ChatMessage::user("which item is lowest?"),
                ChatMessage::model("C has the least stock."),
            ]
        );

        let seen = analyst
            .transcripts
            .lock()
            .map(|seen| seen.clone())
            .unwrap_or_default();
        assert_eq!(seen, vec![vec![ChatMessage::user("which item is lowest?")]]);
        Ok(())
    }

    #[test]
    fn second_analysis_while_pending_is_rejected() -> Result<()> {
        let analyst = Arc::new(ScriptedAnalyst::answering(sample_analysis(), "ok"));
        let (_dir, mut shell) = loaded_shell(analyst)?;

        shell.execute("analyze")?;
        let err = shell.execute("analyze").expect_err("single flight");
        assert!(err.to_string().contains("already running"));
        pump(&mut shell)?;
        assert!(shell.session().analysis().is_some());
        Ok(())
    }

    #[test]
    fn reset_drops_the_late_analysis() -> Result<()> {
        let analyst = Arc::new(ScriptedAnalyst::answering(sample_analysis(), "ok"));
        let (_dir, mut shell) = loaded_shell(analyst)?;

        shell.execute("analyze")?;
        shell.execute("reset")?;
        pump(&mut shell)?;

        assert!(shell.session().analysis().is_none());
        assert!(!shell.session().has_data());
        assert!(!output(&shell).contains("Data Overview"));
        Ok(())
    }

    #[test]
    fn failed_chat_restores_the_transcript() -> Result<()> {
        let analyst = Arc::new(ScriptedAnalyst {
            analysis: Some(sample_analysis()),
            ..ScriptedAnalyst::default()
        });
        let (_dir, mut shell) = loaded_shell(analyst)?;
        shell.execute("analyze")?;
        pump(&mut shell)?;

        shell.execute("ask why?")?;
        assert_eq!(shell.session().transcript().len(), 1);
        pump(&mut shell)?;

        assert!(shell.session().transcript().is_empty());
        assert_eq!(shell.session().error(), Some("scripted chat failure"));
        assert!(output(&shell).ends_with("error: scripted chat failure\n"));
        Ok(())
    }

    #[test]
    fn asking_before_analysis_is_refused() -> Result<()> {
        let (_dir, mut shell) = loaded_shell(Arc::new(ScriptedAnalyst::default()))?;
        let err = shell.execute("ask anything").expect_err("no analysis yet");
        assert!(err.to_string().contains("Run an analysis"));
        assert!(shell.session().transcript().is_empty());
        Ok(())
    }

    #[test]
    fn bad_file_leaves_the_session_empty_with_an_error() -> Result<()> {
        let (_dir, path) = temp_text_file("notes.txt", "hello")?;
        let mut shell = shell_with(Arc::new(ScriptedAnalyst::default()));
        shell.execute(&format!("load {}", path.display()))?;

        assert!(!shell.session().has_data());
        assert!(output(&shell).contains(
            "error: Unsupported file type. Please upload a CSV or Excel file."
        ));
        Ok(())
    }

    #[test]
    fn todos_ignore_blank_text_and_reject_unknown_ids() -> Result<()> {
        let mut shell = shell_with(Arc::new(ScriptedAnalyst::default()));
        shell.execute("todo add    ")?;
        assert!(shell.session().todos().is_empty());

        shell.execute("todo add Reorder lamps")?;
        shell.execute("todo toggle 1")?;
        assert_eq!(shell.session().todos().open_count(), 0);

        let err = shell.execute("todo rm 5").expect_err("no such item");
        assert!(err.to_string().contains("no action item 5"));
        Ok(())
    }

    #[test]
    fn context_is_written_to_a_file() -> Result<()> {
        let (_dir, mut shell) = loaded_shell(Arc::new(ScriptedAnalyst::default()))?;
        shell.execute("sort stock")?;
        let (_out_dir, path) = temp_file_path("context.json")?;
        shell.execute(&format!("context {}", path.display()))?;

        let json: Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        assert_eq!(json["schema"], serde_json::json!(["name", "stock"]));
        assert_eq!(json["viewSettings"]["sortConfig"]["key"], "stock");
        assert_eq!(json["dataSnapshot"].as_array().map(Vec::len), Some(3));
        assert!(json["initialAnalysis"].is_null());
        Ok(())
    }

    #[test]
    fn navigation_and_theme_notices_are_printed() -> Result<()> {
        let mut shell = shell_with(Arc::new(ScriptedAnalyst::default()));
        shell.execute("nav orders")?;
        assert!(output(&shell).ends_with("* orders: coming soon\n"));

        shell.execute("theme")?;
        assert_eq!(shell.controller().state().theme, Theme::Dark);
        assert!(output(&shell).ends_with("* dark theme\n"));
        Ok(())
    }

    #[test]
    fn nav_next_and_prev_cycle_through_views() -> Result<()> {
        let mut shell = shell_with(Arc::new(ScriptedAnalyst::default()));
        shell.execute("nav next")?;
        assert_eq!(shell.controller().state().nav, NavView::Inventory);
        assert!(output(&shell).ends_with("* inventory: coming soon\n"));

        shell.execute("nav prev")?;
        assert_eq!(shell.controller().state().nav, NavView::Dashboard);
        assert_eq!(shell.controller().state().status_line, None);

        shell.execute("nav prev")?;
        assert_eq!(shell.controller().state().nav, NavView::Settings);
        Ok(())
    }

    #[test]
    fn grid_view_renders_product_cards() -> Result<()> {
        let (_dir, path) = temp_csv(&CatalogFaker::new(12).catalog(4))?;
        let mut shell = shell_with(Arc::new(ScriptedAnalyst::default()));
        shell.execute(&format!("load {}", path.display()))?;
        shell.execute("view grid")?;

        let text = output(&shell);
        assert!(text.contains("| $"));
        assert!(text.contains("Rows 1-3 of 4 | Page 1 of 2"));
        Ok(())
    }

    #[test]
    fn quit_and_closed_input_end_the_loop() -> Result<()> {
        let mut shell = shell_with(Arc::new(ScriptedAnalyst::default()));
        assert_eq!(shell.execute("quit")?, Flow::Quit);
        assert_eq!(
            shell.handle_event(crate::runtime::RuntimeEvent::InputClosed)?,
            Flow::Quit
        );
        assert_eq!(
            shell.handle_event(crate::runtime::RuntimeEvent::Input("bogus".to_owned()))?,
            Flow::Continue
        );
        assert!(output(&shell).contains("error: unknown command \"bogus\""));
        Ok(())
    }
}
