//! Ratatui-based terminal UI.
//!
//! Left column: the material selection control and the upload form.
//! Right column: the analysis panel (forecast chart, prediction table, vendor
//! detail). Notifications stack in the top-right corner.
//!
//! Keys map onto the orchestrator's named events; the loop polls input, applies
//! finished gateway results, expires notifications, and redraws.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, Wrap},
    Terminal,
};

use crate::app::orchestrator::Orchestrator;
use crate::config::ClientConfig;
use crate::domain::UploadRole;
use crate::error::{AppError, EXIT_RUNTIME};
use crate::notify::{Phase, Severity};
use crate::render::tables::{PREDICTION_COLUMNS, VENDOR_COLUMNS};
use crate::render::{Region, RowMarker, TableRow};

mod csv_choices;
mod plotters_chart;

use csv_choices::{CsvChoices, display_path};
use plotters_chart::ForecastChart;

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];
const NOTIFICATION_WIDTH: u16 = 48;

/// Start the TUI.
pub fn run(orchestrator: Orchestrator, config: &ClientConfig) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(EXIT_RUNTIME, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(orchestrator, config);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode()
            .map_err(|e| AppError::new(EXIT_RUNTIME, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(EXIT_RUNTIME, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Materials,
    Upload,
}

/// Rows of the upload form: one per role, then the submit control.
const SUBMIT_ROW: usize = 3;

struct App {
    orch: Orchestrator,
    api_base: String,
    focus: Focus,
    /// Highlighted option in the selection control.
    cursor: usize,
    upload_row: usize,
    editing_path: bool,
    path_input: String,
    csv: CsvChoices,
    frame_count: usize,
}

impl App {
    fn new(mut orch: Orchestrator, config: &ClientConfig) -> Self {
        orch.load_materials();
        Self {
            orch,
            api_base: config.api_base.clone(),
            focus: Focus::Materials,
            cursor: 0,
            upload_row: 0,
            editing_path: false,
            path_input: String::new(),
            csv: CsvChoices::scan(Path::new(".")),
            frame_count: 0,
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if self.orch.pump() {
                self.cursor = self.cursor.min(self.orch.selection.options().len().saturating_sub(1));
                needs_redraw = true;
            }
            let now = Instant::now();
            if self.orch.notifier.tick(now) || self.animating(now) {
                needs_redraw = true;
            }

            if needs_redraw {
                self.frame_count = self.frame_count.wrapping_add(1);
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(EXIT_RUNTIME, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(EXIT_RUNTIME, format!("Event poll error: {e}")))? {
                continue;
            }

            match event::read().map_err(|e| AppError::new(EXIT_RUNTIME, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Anything on screen that changes without input (spinners, fades).
    fn animating(&self, now: Instant) -> bool {
        self.orch.selection.fetch_in_flight()
            || self.orch.upload.spinner_visible()
            || self.orch.materials_loading()
            || self.orch.notifier.any_fading(now)
    }

    /// Returns `true` when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.editing_path {
            self.handle_path_edit(code);
            return false;
        }

        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Materials => Focus::Upload,
                    Focus::Upload => Focus::Materials,
                };
            }
            KeyCode::Char('r') => self.orch.on_fetch_triggered(),
            KeyCode::Char('u') => self.orch.on_form_submitted(),
            KeyCode::Char('e') => self.export(),
            KeyCode::Char('l') => {
                if !self.orch.materials_loading() {
                    self.orch.load_materials();
                }
            }
            _ => match self.focus {
                Focus::Materials => self.handle_materials_key(code),
                Focus::Upload => self.handle_upload_key(code),
            },
        }
        false
    }

    fn handle_materials_key(&mut self, code: KeyCode) {
        if !self.orch.selection.control_enabled() {
            return;
        }
        let n = self.orch.selection.options().len();
        match code {
            KeyCode::Up => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Down => {
                if self.cursor + 1 < n {
                    self.cursor += 1;
                }
            }
            KeyCode::Enter => self.orch.on_selection_changed(self.cursor),
            _ => {}
        }
    }

    fn handle_upload_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Up => self.upload_row = self.upload_row.saturating_sub(1),
            KeyCode::Down => self.upload_row = (self.upload_row + 1).min(SUBMIT_ROW),
            KeyCode::Left => self.cycle_csv(-1),
            KeyCode::Right => self.cycle_csv(1),
            KeyCode::Char('x') | KeyCode::Delete => {
                if let Some(role) = self.upload_role() {
                    self.orch.upload.bind(role, None);
                    self.csv.reset(role);
                }
            }
            KeyCode::Enter => match self.upload_role() {
                Some(role) => {
                    self.path_input = self
                        .orch
                        .upload
                        .slot(role)
                        .map(|p| p.display().to_string())
                        .unwrap_or_default();
                    self.editing_path = true;
                }
                None => self.orch.on_form_submitted(),
            },
            _ => {}
        }
    }

    fn handle_path_edit(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                self.editing_path = false;
            }
            KeyCode::Enter => {
                self.editing_path = false;
                if let Some(role) = self.upload_role() {
                    let trimmed = self.path_input.trim();
                    let path = (!trimmed.is_empty()).then(|| PathBuf::from(trimmed));
                    self.orch.upload.bind(role, path);
                    self.csv.reset(role);
                }
            }
            KeyCode::Backspace => {
                self.path_input.pop();
            }
            KeyCode::Char(c) => self.path_input.push(c),
            _ => {}
        }
    }

    fn upload_role(&self) -> Option<UploadRole> {
        UploadRole::ALL.get(self.upload_row).copied()
    }

    /// Step through discovered CSV files for the focused role.
    fn cycle_csv(&mut self, delta: isize) {
        let Some(role) = self.upload_role() else {
            return;
        };
        match self.csv.step(role, delta) {
            Some(path) => self.orch.upload.bind(role, Some(path)),
            None => self
                .orch
                .notifier
                .notify("No .csv files found under the current directory.", Severity::Warning),
        }
    }

    fn export(&mut self) {
        let Some(material_id) = self.orch.selection.selected().map(str::to_string) else {
            self.orch
                .notifier
                .notify("Select a material before exporting.", Severity::Warning);
            return;
        };
        let path = crate::io::default_export_path(&material_id, chrono::Local::now());
        match crate::io::write_analysis_csv(
            &path,
            &material_id,
            self.orch.view.prediction.as_ref(),
            self.orch.view.recommendation.as_ref(),
        ) {
            Ok(()) => self
                .orch
                .notifier
                .notify(format!("Exported to {}", path.display()), Severity::Success),
            Err(err) => self.orch.notifier.notify(err.to_string(), Severity::Error),
        }
    }

    fn spinner(&self) -> &'static str {
        SPINNER[self.frame_count % SPINNER.len()]
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
        self.draw_notifications(frame, size);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let state = self.orch.ui_state();
        let fetch = if state.fetch_in_flight {
            format!("fetching {}", self.spinner())
        } else {
            "idle".to_string()
        };
        let upload = if state.upload_in_flight {
            format!("uploading {}", self.spinner())
        } else {
            "idle".to_string()
        };

        let lines = vec![
            Line::from(vec![
                Span::styled("procure", Style::default().fg(Color::Cyan)),
                Span::raw(" - material price forecasts & vendor ranking"),
            ]),
            Line::from(Span::styled(
                format!(
                    "api: {} | material: {} | fetch: {fetch} | upload: {upload}",
                    self.api_base,
                    state.selected_material_id.as_deref().unwrap_or("-"),
                ),
                Style::default().fg(Color::Gray),
            )),
        ];

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(40), Constraint::Min(0)])
            .split(area);

        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(7)])
            .split(cols[0]);

        self.draw_materials(frame, left[0]);
        self.draw_upload_form(frame, left[1]);
        self.draw_analysis(frame, cols[1]);
    }

    fn focus_style(&self, focus: Focus) -> Style {
        if self.focus == focus {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        }
    }

    fn draw_materials(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let enabled = self.orch.selection.control_enabled();
        let selected = self.orch.selection.selected_index();

        let items: Vec<ListItem> = self
            .orch
            .selection
            .options()
            .iter()
            .enumerate()
            .map(|(i, o)| {
                let mark = if i == selected && o.material_id.is_some() { "● " } else { "  " };
                let style = if !enabled {
                    Style::default().fg(Color::DarkGray)
                } else if o.material_id.is_none() {
                    Style::default().fg(Color::Gray)
                } else {
                    Style::default()
                };
                ListItem::new(format!("{mark}{}", o.label)).style(style)
            })
            .collect();

        let mut title = "Materials".to_string();
        if self.orch.materials_loading() {
            title.push_str(&format!(" {}", self.spinner()));
        } else if !enabled {
            title.push_str(" (locked)");
        }

        let list = List::new(items)
            .block(
                Block::default()
                    .title(title)
                    .borders(Borders::ALL)
                    .border_style(self.focus_style(Focus::Materials)),
            )
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        if self.focus == Focus::Materials && enabled {
            state.select(Some(self.cursor));
        }
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_upload_form(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let focused = self.focus == Focus::Upload;
        let mut lines: Vec<Line> = Vec::new();

        for (row, role) in UploadRole::ALL.iter().enumerate() {
            let value = if self.editing_path && focused && self.upload_row == row {
                format!("{}_", self.path_input)
            } else {
                self.orch
                    .upload
                    .slot(*role)
                    .map(|p| display_path(p))
                    .unwrap_or_else(|| "(none)".to_string())
            };
            let style = if focused && self.upload_row == row {
                Style::default().fg(Color::Black).bg(Color::White)
            } else {
                Style::default()
            };
            lines.push(Line::from(Span::styled(
                format!("{:<14} {}", role.display_name(), crate::render::format::truncate(&value, 20)),
                style,
            )));
        }

        let submit = if self.orch.upload.spinner_visible() {
            format!("[ Uploading {} ]", self.spinner())
        } else {
            "[ Upload ]".to_string()
        };
        let submit_style = if !self.orch.upload.submit_enabled() {
            Style::default().fg(Color::DarkGray)
        } else if focused && self.upload_row == SUBMIT_ROW {
            Style::default().fg(Color::Black).bg(Color::White)
        } else {
            Style::default().fg(Color::Green)
        };
        lines.push(Line::from(Span::styled(submit, submit_style)));

        let p = Paragraph::new(Text::from(lines)).block(
            Block::default()
                .title("Upload data")
                .borders(Borders::ALL)
                .border_style(self.focus_style(Focus::Upload)),
        );
        frame.render_widget(p, area);
    }

    fn draw_analysis(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        if !self.orch.view.visible {
            let msg = if self.orch.materials_loading() {
                "Loading materials..."
            } else {
                "No data yet. Upload the three CSV files to begin (Tab to switch to the form)."
            };
            let p = Paragraph::new(msg)
                .style(Style::default().fg(Color::Yellow))
                .wrap(Wrap { trim: true })
                .block(Block::default().title("Analysis").borders(Borders::ALL));
            frame.render_widget(p, area);
            return;
        }

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(area);
        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(rows[1]);

        self.draw_chart(frame, rows[0]);
        self.draw_predictions(frame, bottom[0]);
        self.draw_vendors(frame, bottom[1]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Price Forecast").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        match &self.orch.view.chart_region {
            Region::Empty => {
                let msg = Paragraph::new("Select a material to see its forecast.")
                    .style(Style::default().fg(Color::Gray));
                frame.render_widget(msg, inner);
            }
            Region::Error(text) => {
                let msg = Paragraph::new(text.as_str())
                    .style(Style::default().fg(Color::Red))
                    .wrap(Wrap { trim: true });
                frame.render_widget(msg, inner);
            }
            Region::Loading(text) => {
                // The overlay covers whatever chart is still in the slot.
                if let Some(chart) = self.orch.view.chart.current() {
                    frame.render_widget(ForecastChart { view: &chart.view }, inner);
                }
                draw_overlay(frame, inner, &format!("{} {text}", self.spinner()));
            }
            Region::Ready(_) => {
                if let Some(chart) = self.orch.view.chart.current() {
                    let legend_rect = Rect { height: 1, ..inner };
                    let chart_rect = Rect {
                        y: inner.y + 1,
                        height: inner.height.saturating_sub(1),
                        ..inner
                    };
                    frame.render_widget(legend(), legend_rect);
                    frame.render_widget(ForecastChart { view: &chart.view }, chart_rect);
                }
            }
        }
    }

    fn draw_predictions(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Predictions").borders(Borders::ALL);
        let widths = [Constraint::Length(12), Constraint::Length(16), Constraint::Min(16)];
        render_table(frame, area, block, &PREDICTION_COLUMNS, &widths, &self.orch.view.prediction_rows);
    }

    fn draw_vendors(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Vendor Recommendation").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(inner);

        let detail = match &self.orch.view.vendor_detail {
            Region::Empty => Paragraph::new(""),
            Region::Loading(text) => Paragraph::new(format!("{} {text}", self.spinner()))
                .style(Style::default().fg(Color::Yellow)),
            Region::Error(text) => Paragraph::new(text.as_str())
                .style(Style::default().fg(Color::Red))
                .wrap(Wrap { trim: true }),
            Region::Ready(summary) => {
                let mut lines = vec![
                    Line::from(vec![
                        Span::raw("Best vendor: "),
                        Span::styled(
                            summary.best_vendor_id.clone(),
                            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                        ),
                    ]),
                    Line::from(format!("Weighted score: {}", summary.weighted_score)),
                ];
                if let Some(b) = &summary.breakdown {
                    lines.push(Line::from(Span::styled(b.clone(), Style::default().fg(Color::Gray))));
                }
                Paragraph::new(Text::from(lines))
            }
        };
        frame.render_widget(detail, parts[0]);

        let widths = [
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(11),
            Constraint::Length(11),
            Constraint::Length(15),
            Constraint::Length(9),
        ];
        render_table(frame, parts[1], Block::default(), &VENDOR_COLUMNS, &widths, &self.orch.view.vendor_rows);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = if self.editing_path {
            "type a path  Enter apply  Esc cancel"
        } else {
            match self.focus {
                Focus::Materials => "↑/↓ move  Enter select  r refresh  e export  l reload  Tab upload  q quit",
                Focus::Upload => "↑/↓ field  ←/→ pick csv  Enter edit/submit  x clear  u upload  Tab materials  q quit",
            }
        };
        let p = Paragraph::new(Line::from(Span::styled(help, Style::default().fg(Color::Gray))))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_notifications(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let now = Instant::now();
        let width = NOTIFICATION_WIDTH.min(area.width);
        let mut y = area.y + 1;

        for n in self.orch.notifier.active() {
            if y + 3 > area.y + area.height {
                break;
            }
            let color = match n.severity {
                Severity::Success => Color::Green,
                Severity::Warning => Color::Yellow,
                Severity::Error => Color::Red,
            };
            let style = match n.phase(now) {
                Phase::Visible => Style::default().fg(color),
                Phase::Fading => Style::default().fg(Color::DarkGray),
            };
            let rect = Rect {
                x: area.x + area.width - width,
                y,
                width,
                height: 3,
            };
            let p = Paragraph::new(crate::render::format::truncate(&n.message, (width as usize).saturating_sub(4)))
                .style(style)
                .block(Block::default().title(n.severity.label()).borders(Borders::ALL).border_style(style));
            frame.render_widget(Clear, rect);
            frame.render_widget(p, rect);
            y += 3;
        }
    }
}

fn legend() -> Paragraph<'static> {
    Paragraph::new(Line::from(vec![
        Span::styled("── historical  ", Style::default().fg(Color::White)),
        Span::styled("── predicted  ", Style::default().fg(Color::Cyan)),
        Span::styled("██ confidence band", Style::default().fg(Color::Blue)),
    ]))
}

fn draw_overlay(frame: &mut ratatui::Frame<'_>, area: Rect, text: &str) {
    let width = (text.chars().count() as u16 + 4).min(area.width);
    let rect = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + area.height.saturating_sub(3) / 2,
        width,
        height: 3.min(area.height),
    };
    let p = Paragraph::new(text)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(Clear, rect);
    frame.render_widget(p, rect);
}

/// Draw rows as a table. A placeholder row is drawn as a single line across the table.
fn render_table(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    block: Block<'_>,
    columns: &[&str],
    widths: &[Constraint],
    rows: &[TableRow],
) {
    if let [TableRow::Placeholder { text, .. }] = rows {
        let p = Paragraph::new(text.as_str())
            .style(Style::default().fg(Color::Gray))
            .block(block);
        frame.render_widget(p, area);
        return;
    }

    let header = Row::new(columns.iter().map(|c| Cell::from(*c)))
        .style(Style::default().add_modifier(Modifier::BOLD));

    let body = rows.iter().filter_map(|row| match row {
        TableRow::Cells { cells, marker } => {
            let row_cells = cells.iter().enumerate().map(|(i, text)| {
                let cell = Cell::from(text.clone());
                match marker {
                    RowMarker::Best { highlight_column } if *highlight_column == i => {
                        cell.style(Style::default().fg(Color::Black).bg(Color::Yellow))
                    }
                    _ => cell,
                }
            });
            let style = match marker {
                RowMarker::Best { .. } => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                RowMarker::Plain => Style::default(),
            };
            Some(Row::new(row_cells.collect::<Vec<_>>()).style(style))
        }
        TableRow::Placeholder { .. } => None,
    });

    let table = Table::new(body, widths.to_vec()).header(header).block(block);
    frame.render_widget(table, area);
}
