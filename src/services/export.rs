//! Retro export - JSON, CSV and PDF downloads

use crate::core::{AppError, AppState};
use crate::dtos::RetroDetailsDTO;
use crate::repositories::ReadMany;
use crate::services::retro::load_details;
use axum::{
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Rgb,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExportFormat {
    Json,
    Csv,
    Pdf,
}

impl ExportFormat {
    /// Format names are case-insensitive
    pub fn parse(format: &str) -> Option<Self> {
        match format.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

fn csv_error(err: impl std::fmt::Display) -> AppError {
    AppError::internal_server_error("Failed to write CSV").with_details(err.to_string())
}

fn csv_section(records: &[Vec<&str>]) -> Result<Vec<u8>, AppError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());
    for record in records {
        writer.write_record(record).map_err(csv_error)?;
    }
    writer.into_inner().map_err(csv_error)
}

/// Items under their category, then the action items after a blank line
pub fn retro_to_csv(
    details: &RetroDetailsDTO,
    authors: &HashMap<i64, String>,
) -> Result<Vec<u8>, AppError> {
    let votes: Vec<String> = details.items.iter().map(|i| i.votes.to_string()).collect();
    let mut items = vec![vec!["Category", "Content", "Votes", "Author"]];
    for (item, votes) in details.items.iter().zip(&votes) {
        items.push(vec![
            details.category_name(&item.category_id),
            item.content.as_str(),
            votes.as_str(),
            authors.get(&item.author_id).map(String::as_str).unwrap_or(""),
        ]);
    }

    let mut actions = vec![vec!["Action Item", "Assignee", "Done"]];
    for action in &details.action_items {
        actions.push(vec![
            action.content.as_str(),
            action.assignee.as_deref().unwrap_or(""),
            if action.done { "yes" } else { "no" },
        ]);
    }

    let mut out = csv_section(&items)?;
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(&csv_section(&actions)?);
    Ok(out)
}

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
/// Millimetres per point
const PT_TO_MM: f32 = 0.3528;

/// Parses `#RRGGBB`, falling back to black
fn hex_color(hex: &str) -> Color {
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|c| u8::from_str_radix(c, 16).ok())
            .map(|c| c as f32 / 255.0)
    };
    match (channel(1..3), channel(3..5), channel(5..7)) {
        (Some(r), Some(g), Some(b)) if hex.starts_with('#') => Color::Rgb(Rgb::new(r, g, b, None)),
        _ => Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)),
    }
}

/// Splits text into lines of at most `width` characters, on word boundaries
/// when possible
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        let mut word = word.to_string();
        while word.chars().count() > width {
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            let head: String = word.chars().take(width).collect();
            word = word.chars().skip(width).collect();
            lines.push(head);
        }
        if !line.is_empty() && line.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(&word);
    }
    if !line.is_empty() || lines.is_empty() {
        lines.push(line);
    }
    lines
}

/// Top-to-bottom text cursor that opens a new page when it runs out of room
struct PdfCursor {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
}

impl PdfCursor {
    fn new(title: &str) -> Result<Self, AppError> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_error)?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            y: PAGE_HEIGHT - MARGIN,
        })
    }

    fn write(&mut self, text: &str, size: f32, bold: bool, color: Color, centered: bool) {
        let line_height = size * PT_TO_MM * 1.4;
        // Helvetica glyphs average about half an em
        let width = ((PAGE_WIDTH - 2.0 * MARGIN) / (size * PT_TO_MM * 0.5)) as usize;
        for line in wrap(text, width.max(1)) {
            if self.y - line_height < MARGIN {
                let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
                self.layer = self.doc.get_page(page).get_layer(layer);
                self.y = PAGE_HEIGHT - MARGIN;
            }
            self.y -= line_height;
            let x = if centered {
                let text_width = line.chars().count() as f32 * size * PT_TO_MM * 0.5;
                ((PAGE_WIDTH - text_width) / 2.0).max(MARGIN)
            } else {
                MARGIN
            };
            let font = if bold { &self.bold } else { &self.regular };
            self.layer.set_fill_color(color.clone());
            self.layer.use_text(line, size, Mm(x), Mm(self.y), font);
        }
    }

    fn gap(&mut self, mm: f32) {
        self.y -= mm;
    }

    fn finish(self) -> Result<Vec<u8>, AppError> {
        self.doc.save_to_bytes().map_err(pdf_error)
    }
}

fn pdf_error(err: impl std::fmt::Debug) -> AppError {
    AppError::internal_server_error("Failed to render PDF").with_details(format!("{:?}", err))
}

/// Title, template, each category with its items and votes, the action
/// items and a generation footer
pub fn retro_to_pdf(
    details: &RetroDetailsDTO,
    generated_at: DateTime<Utc>,
) -> Result<Vec<u8>, AppError> {
    let black = || Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None));
    let mut pdf = PdfCursor::new(&details.retro.title)?;

    pdf.write(&details.retro.title, 24.0, true, black(), true);
    pdf.gap(8.0);
    pdf.write(
        &format!("Date: {}", details.retro.created_at.format("%Y-%m-%d")),
        12.0,
        false,
        black(),
        false,
    );
    let template = details
        .template
        .as_ref()
        .map(|t| t.name.as_str())
        .unwrap_or("None");
    pdf.write(&format!("Template: {}", template), 12.0, false, black(), false);
    pdf.gap(8.0);

    for category in details.retro.categories.0.iter() {
        pdf.write(&category.name, 16.0, true, hex_color(&category.color), false);
        pdf.gap(2.0);
        for item in details.items.iter().filter(|i| i.category_id == category.id) {
            pdf.write(
                &format!("- {} ({} votes)", item.content, item.votes),
                12.0,
                false,
                black(),
                false,
            );
        }
        pdf.gap(5.0);
    }

    if !details.action_items.is_empty() {
        pdf.write("Action Items", 16.0, true, black(), false);
        pdf.gap(2.0);
        for action in &details.action_items {
            pdf.write(
                &format!(
                    "- {} (Assigned to: {})",
                    action.content,
                    action.assignee.as_deref().unwrap_or("nobody")
                ),
                12.0,
                false,
                black(),
                false,
            );
        }
    }

    pdf.gap(10.0);
    pdf.write(
        &format!("Generated on {}", generated_at.format("%Y-%m-%d %H:%M UTC")),
        10.0,
        false,
        black(),
        true,
    );
    pdf.finish()
}

fn attachment(content_type: &'static str, filename: String, body: Vec<u8>) -> Result<Response, AppError> {
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
        .map_err(|_| AppError::internal_server_error("Invalid export filename"))?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(content_type)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

#[instrument(skip(state))]
pub async fn export_retro(
    State(state): State<Arc<AppState>>,
    Path((retro_id, format)): Path<(i64, String)>,
) -> Result<Response, AppError> {
    let format = ExportFormat::parse(&format).ok_or_else(|| {
        AppError::bad_request("Unsupported export format")
            .with_details("Use one of json, csv or pdf")
    })?;

    let details = load_details(&state, retro_id).await?;
    info!(items = details.items.len(), ?format, "Exporting retro");

    match format {
        ExportFormat::Json => {
            let body = serde_json::to_vec_pretty(&details)
                .map_err(|_| AppError::internal_server_error("Failed to serialize retro"))?;
            attachment("application/json", format!("retro-{}.json", retro_id), body)
        }
        ExportFormat::Pdf => attachment(
            "application/pdf",
            format!("retro-{}.pdf", retro_id),
            retro_to_pdf(&details, Utc::now())?,
        ),
        ExportFormat::Csv => {
            let mut author_ids: Vec<i64> = details.items.iter().map(|i| i.author_id).collect();
            author_ids.sort_unstable();
            author_ids.dedup();
            let authors: HashMap<i64, String> = state
                .user
                .read_many(&author_ids)
                .await?
                .into_iter()
                .map(|u| (u.user_id, u.username))
                .collect();

            attachment(
                "text/csv; charset=utf-8",
                format!("retro-{}.csv", retro_id),
                retro_to_csv(&details, &authors)?,
            )
        }
    }
}
