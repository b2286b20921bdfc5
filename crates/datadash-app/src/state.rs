// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::fmt;

use crate::{NavView, Theme};

pub const PLACEHOLDER_NOTICE: &str = "coming soon";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub theme: Theme,
    pub nav: NavView,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            nav: NavView::Dashboard,
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    ToggleTheme,
    SetTheme(Theme),
    Navigate(NavView),
    NextView,
    PrevView,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    ThemeChanged(Theme),
    NavChanged(NavView),
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn with_theme(theme: Theme) -> Self {
        Self {
            theme,
            ..Self::default()
        }
    }

    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::ToggleTheme => self.apply_theme(self.theme.toggled()),
            AppCommand::SetTheme(theme) => {
                if theme == self.theme {
                    Vec::new()
                } else {
                    self.apply_theme(theme)
                }
            }
            AppCommand::Navigate(view) => self.navigate(view),
            AppCommand::NextView => self.rotate_view(1),
            AppCommand::PrevView => self.rotate_view(-1),
        }
    }

    fn apply_theme(&mut self, theme: Theme) -> Vec<AppEvent> {
        self.theme = theme;
        vec![
            AppEvent::ThemeChanged(theme),
            self.set_status(&format!("{} theme", theme.as_str())),
        ]
    }

    fn rotate_view(&mut self, delta: isize) -> Vec<AppEvent> {
        let views = NavView::ALL;
        let current = views
            .iter()
            .position(|view| *view == self.nav)
            .unwrap_or(0) as isize;
        let len = views.len() as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        self.navigate(views[next])
    }

    fn navigate(&mut self, view: NavView) -> Vec<AppEvent> {
        self.nav = view;
        let mut events = vec![AppEvent::NavChanged(view)];
        if view.is_placeholder() {
            events.push(self.set_status(&format!("{}: {PLACEHOLDER_NOTICE}", view.label())));
        } else if self.status_line.take().is_some() {
            events.push(AppEvent::StatusCleared);
        }
        events
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}

type Listener = Box<dyn FnMut(&AppEvent)>;

/// Owns the [`AppState`] and fans every emitted event out to subscribers in
/// registration order.
#[derive(Default)]
pub struct AppController {
    state: AppState,
    listeners: Vec<Listener>,
}

impl fmt::Debug for AppController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppController")
            .field("state", &self.state)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl AppController {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            listeners: Vec::new(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&AppEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        let events = self.state.dispatch(command);
        for event in &events {
            for listener in &mut self.listeners {
                listener(event);
            }
        }
        events
    }
}
