// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Moderation embed rendering.
//!
//! [`render`] is pure so the layout can be tested without a gateway;
//! [`SurfaceView::to_embed`] is the only serenity-facing part.

use kidstunes_core::Request;
use kidstunes_core::types::SurfaceStage;
use serenity::builder::{CreateEmbed, CreateEmbedFooter};

pub const COLOR_PENDING: u32 = 0x0000FF;
pub const COLOR_DOWNLOADING: u32 = 0xFFFF00;
pub const COLOR_COMPLETE: u32 = 0x00FF00;
pub const COLOR_FAILED: u32 = 0xFF0000;

/// Discord rejects embed field values longer than this.
const MAX_FIELD_LEN: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedField {
    pub name: &'static str,
    pub value: String,
    pub inline: bool,
}

/// Everything an approval embed shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceView {
    pub title: String,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    pub footer: Option<String>,
}

impl SurfaceView {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    pub fn to_embed(&self) -> CreateEmbed {
        let mut embed = CreateEmbed::new().title(&self.title).color(self.color);
        for field in &self.fields {
            embed = embed.field(field.name, &field.value, field.inline);
        }
        if let Some(footer) = &self.footer {
            embed = embed.footer(CreateEmbedFooter::new(footer));
        }
        embed
    }
}

/// Status line and color for a stage.
pub fn stage_label(stage: &SurfaceStage) -> (&'static str, u32) {
    match stage {
        SurfaceStage::Pending => ("Pending Approval", COLOR_PENDING),
        SurfaceStage::Downloading => ("Downloading...", COLOR_DOWNLOADING),
        SurfaceStage::Complete => ("Complete ✓", COLOR_COMPLETE),
        SurfaceStage::Failed(_) => ("Failed ✗", COLOR_FAILED),
        SurfaceStage::Rejected => ("Rejected", COLOR_FAILED),
    }
}

fn push(fields: &mut Vec<EmbedField>, name: &'static str, value: &str, inline: bool) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }
    let value = if value.chars().count() > MAX_FIELD_LEN {
        let mut cut: String = value.chars().take(MAX_FIELD_LEN - 1).collect();
        cut.push('…');
        cut
    } else {
        value.to_string()
    };
    fields.push(EmbedField {
        name,
        value,
        inline,
    });
}

/// `2026-10-19T08:30:00.000Z` as `2026-10-19 08:30:00`.
fn requested_at(created_at: &str) -> Option<String> {
    if created_at.is_empty() {
        return None;
    }
    match chrono::DateTime::parse_from_rfc3339(created_at) {
        Ok(at) => Some(at.format("%Y-%m-%d %H:%M:%S").to_string()),
        Err(_) => Some(created_at.to_string()),
    }
}

/// Render `request` at `stage`.
pub fn render(request: &Request, stage: &SurfaceStage) -> SurfaceView {
    let mut fields = Vec::new();
    push(&mut fields, "Requester", &request.requester_name, true);
    push(&mut fields, "Original Request", &request.original_query, true);

    let identified: Vec<String> = [
        ("🎤 **Artist:**", request.artist.as_deref()),
        ("🎵 **Song:**", request.song.as_deref()),
        ("💿 **Album:**", Some(request.album.as_str())),
    ]
    .into_iter()
    .filter_map(|(label, value)| {
        value
            .filter(|v| !v.trim().is_empty())
            .map(|v| format!("{label} {v}"))
    })
    .collect();
    push(&mut fields, "🎼 Identified Music", &identified.join("\n"), false);

    if let Some(refined) = &request.refined_query
        && refined != &request.original_query
    {
        push(&mut fields, "🔍 Refined Search", refined, false);
    }

    let (status, color) = stage_label(stage);
    push(&mut fields, "Status", status, false);
    if let Some(title) = &request.source_title {
        push(&mut fields, "Source Title", title, false);
    }
    if let SurfaceStage::Failed(error) = stage {
        push(&mut fields, "Error", error, false);
    }

    SurfaceView {
        title: format!("Music Request #{}", request.id),
        color,
        fields,
        footer: requested_at(&request.created_at).map(|at| format!("Requested at {at}")),
    }
}
