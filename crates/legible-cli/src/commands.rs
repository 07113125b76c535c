// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command implementations, kept apart from argument parsing so they can be
// driven directly from tests.

use std::fs;
use std::path::{Path, PathBuf};

use legible_core::config::{ConverterConfig, FormattingConfig, ResolvedFormatting, SettingsFile};
use legible_core::error::{LegibleError, Result};
use legible_document::{ConversionReport, DocumentConverter};
use serde::Serialize;
use tracing::{info, instrument, warn};

/// Everything `legible convert` was asked to do.
#[derive(Debug, Clone, Default)]
pub struct ConvertRequest {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub font_name: Option<String>,
    pub font_size: Option<f32>,
    pub line_spacing: Option<f32>,
    pub letter_spacing: Option<f32>,
    pub text_color: Option<String>,
    pub font_dirs: Vec<PathBuf>,
    pub report: bool,
}

/// Process exit status for a failed command: 2 for unusable settings,
/// 1 for everything else.
pub fn exit_code_for(err: &LegibleError) -> u8 {
    match err {
        LegibleError::InvalidConfig(_) | LegibleError::Serialization(_) => 2,
        _ => 1,
    }
}

/// Convert one file and write the result. A diagnostic document counts as
/// success: the reader still gets a PDF explaining what went wrong.
#[instrument(skip_all, fields(input = %request.input.display()))]
pub fn convert(request: &ConvertRequest) -> Result<ConversionReport> {
    let settings = match &request.config {
        Some(path) => SettingsFile::load(path)?,
        None => SettingsFile::default(),
    };
    let (converter_config, formatting) = apply_overrides(settings, request);
    converter_config.layout.validate()?;
    formatting.validate()?;

    let input = fs::read(&request.input)?;
    let conversion = DocumentConverter::new(converter_config).convert(&input, &formatting)?;

    let output = request
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&request.input));
    fs::write(&output, &conversion.bytes)?;

    if let Some(diagnostic) = &conversion.report.diagnostic {
        warn!(output = %output.display(), %diagnostic, "wrote a diagnostic document instead of a conversion");
    } else {
        info!(
            output = %output.display(),
            pages = conversion.report.pages.len(),
            "converted document written"
        );
    }

    if request.report {
        println!("{}", serde_json::to_string_pretty(&conversion.report)?);
    }
    Ok(conversion.report)
}

/// What `legible check-config` prints.
#[derive(Debug, Serialize)]
struct CheckedSettings {
    converter: ConverterConfig,
    formatting: ResolvedFormatting,
}

/// Strictly validate a settings file and render it, with formatting
/// resolved, as pretty JSON.
pub fn check_config(path: &Path) -> Result<String> {
    let settings = SettingsFile::load(path)?;
    let formatting = settings.formatting.validate()?;
    let checked = CheckedSettings {
        converter: settings.converter,
        formatting,
    };
    Ok(serde_json::to_string_pretty(&checked)?)
}

/// Layer command-line flags over the settings file.
fn apply_overrides(
    settings: SettingsFile,
    request: &ConvertRequest,
) -> (ConverterConfig, FormattingConfig) {
    let SettingsFile {
        mut converter,
        mut formatting,
    } = settings;

    if let Some(name) = &request.font_name {
        formatting.font_name = name.clone();
    }
    if let Some(size) = request.font_size {
        formatting.font_size = size;
    }
    if let Some(spacing) = request.line_spacing {
        formatting.line_spacing = spacing;
    }
    if let Some(spacing) = request.letter_spacing {
        formatting.letter_spacing = spacing;
    }
    if let Some(color) = &request.text_color {
        formatting.text_color = color.clone();
    }
    if !request.font_dirs.is_empty() {
        let mut dirs = request.font_dirs.clone();
        dirs.append(&mut converter.fonts.font_dirs);
        converter.fonts.font_dirs = dirs;
    }

    (converter, formatting)
}

/// `notes.pdf` → `notes.legible.pdf`, next to the input.
fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".into());
    input.with_file_name(format!("{stem}.legible.pdf"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{Document, Object, Stream, dictionary};

    /// One Letter page with `text` in Helvetica 12 at (72, 700).
    fn sample_pdf(text: &str) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    fn request_for(input: PathBuf) -> ConvertRequest {
        ConvertRequest {
            input,
            font_name: Some("Helvetica".into()),
            ..ConvertRequest::default()
        }
    }

    #[test]
    fn converts_next_to_the_input_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("notes.pdf");
        fs::write(&input, sample_pdf("Hello reader")).unwrap();

        let report = convert(&request_for(input)).unwrap();
        assert!(report.diagnostic.is_none());

        let output = dir.path().join("notes.legible.pdf");
        let doc = Document::load(&output).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn flags_override_the_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("settings.json");
        fs::write(
            &config,
            r##"{ "formatting": { "font_size": 20, "line_spacing": 30, "text_color": "#003366" } }"##,
        )
        .unwrap();
        let input = dir.path().join("in.pdf");
        fs::write(&input, sample_pdf("spaced out")).unwrap();

        let request = ConvertRequest {
            output: Some(dir.path().join("out.pdf")),
            config: Some(config),
            line_spacing: Some(18.0),
            ..request_for(input)
        };
        let settings = SettingsFile::load(request.config.as_ref().unwrap()).unwrap();
        let (_, formatting) = apply_overrides(settings, &request);
        assert_eq!(formatting.font_size, 20.0);
        assert_eq!(formatting.line_spacing, 18.0);
        assert_eq!(formatting.font_name, "Helvetica");
        assert_eq!(formatting.text_color, "#003366");

        convert(&request).unwrap();
        assert!(dir.path().join("out.pdf").exists());
    }

    #[test]
    fn font_dirs_from_flags_come_first() {
        let request = ConvertRequest {
            font_dirs: vec![PathBuf::from("/opt/fonts")],
            ..ConvertRequest::default()
        };
        let (converter, _) = apply_overrides(SettingsFile::default(), &request);
        assert_eq!(
            converter.fonts.font_dirs,
            [PathBuf::from("/opt/fonts"), PathBuf::from("fonts")]
        );
    }

    #[test]
    fn non_pdf_input_exits_with_one() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("picture.pdf");
        fs::write(&input, b"\x89PNG\r\n\x1a\n").unwrap();

        let err = convert(&request_for(input)).unwrap_err();
        assert!(matches!(err, LegibleError::UnreadableInput(_)));
        assert_eq!(exit_code_for(&err), 1);
    }

    #[test]
    fn missing_input_exits_with_one() {
        let dir = tempfile::tempdir().unwrap();
        let err = convert(&request_for(dir.path().join("absent.pdf"))).unwrap_err();
        assert!(matches!(err, LegibleError::Io(_)));
        assert_eq!(exit_code_for(&err), 1);
    }

    #[test]
    fn invalid_flag_value_exits_with_two() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.pdf");
        fs::write(&input, sample_pdf("x")).unwrap();

        let request = ConvertRequest {
            font_size: Some(0.0),
            ..request_for(input)
        };
        let err = convert(&request).unwrap_err();
        assert_eq!(exit_code_for(&err), 2);
    }

    #[test]
    fn damaged_pdf_still_writes_a_document() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.pdf");
        fs::write(&input, b"%PDF-1.4\n\x00\x00 truncated").unwrap();

        let report = convert(&request_for(input)).unwrap();
        assert!(report.diagnostic.is_some());
        assert!(dir.path().join("broken.legible.pdf").exists());
    }

    #[test]
    fn check_config_resolves_formatting() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("settings.json");
        fs::write(&config, r#"{ "formatting": { "text_color": "navy" } }"#).unwrap();

        let json = check_config(&config).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["formatting"]["font_size"], 12.0);
        assert_eq!(value["formatting"]["text_color"]["Named"]["name"], "navy");
    }

    #[test]
    fn check_config_rejects_bad_colour_with_two() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("settings.json");
        fs::write(&config, r#"{ "formatting": { "text_color": "sparkly" } }"#).unwrap();

        let err = check_config(&config).unwrap_err();
        assert_eq!(exit_code_for(&err), 2);
    }

    #[test]
    fn malformed_settings_file_exits_with_two() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("settings.json");
        fs::write(&config, "{ not json").unwrap();

        let err = check_config(&config).unwrap_err();
        assert!(matches!(err, LegibleError::Serialization(_)));
        assert_eq!(exit_code_for(&err), 2);
    }
}
