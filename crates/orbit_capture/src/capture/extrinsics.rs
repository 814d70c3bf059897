//! Extrinsic record encoding and the `R_matrix.txt` / `T_matrix.txt` codec
//!
//! Each view produces one record `(R, T)`:
//! - `R` is the world-to-camera rotation, the transpose of the pose's
//!   camera-to-world orientation.
//! - `T` depends on the [`TranslationConvention`]; by default it is the camera
//!   centre in world coordinates, not the `t = -R·C` of an `[R|t]` matrix.
//!
//! Rotation files hold three lines per view (row-major), translation files one
//! line per view. Every value is written with six decimals and every line ends
//! with `\n`, so a truncated file is still a parseable prefix.

use serde::{Serialize, Deserialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::foundation::math::{Mat3, Vec3};
use super::error::{CaptureError, CaptureResult, ParseError};
use super::pose_sampler::CameraPose;

/// File holding the per-view world-to-camera rotations
pub const ROTATION_FILE: &str = "R_matrix.txt";

/// File holding the per-view translations
pub const TRANSLATION_FILE: &str = "T_matrix.txt";

/// Meaning of the translation written for each view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TranslationConvention {
    /// `T` is the camera centre `C` in world coordinates
    #[default]
    CameraCenter,
    /// `T` is `t = -R·C`, the translation column of a world-to-camera `[R|t]`
    WorldToCamera,
}

/// One view's extrinsics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtrinsicRecord {
    /// World-to-camera rotation
    pub rotation: Mat3,
    /// Translation under the chosen convention
    pub translation: Vec3,
}

impl ExtrinsicRecord {
    /// Encode a camera pose
    pub fn encode(pose: &CameraPose, convention: TranslationConvention) -> Self {
        let rotation = pose.world_to_camera();
        let translation = match convention {
            TranslationConvention::CameraCenter => pose.position,
            TranslationConvention::WorldToCamera => -(rotation * pose.position),
        };
        Self { rotation, translation }
    }

    /// Camera centre in world coordinates, given the convention the record was written with
    pub fn camera_center(&self, convention: TranslationConvention) -> Vec3 {
        match convention {
            TranslationConvention::CameraCenter => self.translation,
            TranslationConvention::WorldToCamera => -(self.rotation.transpose() * self.translation),
        }
    }

    /// Rotation lines for this record: three rows, each terminated by `\n`
    pub fn format_rotation(&self) -> String {
        self.rotation
            .row_iter()
            .map(|row| format_triple(row[0], row[1], row[2]))
            .collect()
    }

    /// Translation line for this record, terminated by `\n`
    pub fn format_translation(&self) -> String {
        format_triple(self.translation.x, self.translation.y, self.translation.z)
    }

    /// Parse one record from its three rotation lines and one translation line
    pub fn parse(rotation: &str, translation: &str) -> Result<Self, ParseError> {
        let rotations = parse_rotations(rotation)?;
        let translations = parse_translations(translation)?;
        match (rotations.as_slice(), translations.as_slice()) {
            ([rotation], [translation]) => Ok(Self { rotation: *rotation, translation: *translation }),
            _ => Err(ParseError::CountMismatch {
                rotations: rotations.len(),
                translations: translations.len(),
            }),
        }
    }
}

/// Serialize a record as `(rotation lines, translation line)`
pub fn format_record(record: &ExtrinsicRecord) -> (String, String) {
    (record.format_rotation(), record.format_translation())
}

/// Parse one record from its three rotation lines and one translation line
pub fn parse_record(rotation: &str, translation: &str) -> Result<ExtrinsicRecord, ParseError> {
    ExtrinsicRecord::parse(rotation, translation)
}

fn format_triple(a: f64, b: f64, c: f64) -> String {
    format!("{} {} {}\n", fixed6(a), fixed6(b), fixed6(c))
}

/// Six-decimal fixed notation without a negative zero
fn fixed6(value: f64) -> String {
    let text = format!("{value:.6}");
    if text == "-0.000000" {
        "0.000000".to_string()
    } else {
        text
    }
}

/// Parse the non-empty lines of a stream as whitespace-separated triples
fn parse_triples(text: &str) -> Result<Vec<Vec3>, ParseError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            let values = line
                .split_whitespace()
                .map(str::parse::<f64>)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| ParseError::Malformed { line: i + 1, reason: e.to_string() })?;
            match values.as_slice() {
                [x, y, z] if values.iter().all(|v| v.is_finite()) => Ok(Vec3::new(*x, *y, *z)),
                [_, _, _] => Err(ParseError::Malformed {
                    line: i + 1,
                    reason: "non-finite value".to_string(),
                }),
                _ => Err(ParseError::Malformed {
                    line: i + 1,
                    reason: format!("expected 3 values, found {}", values.len()),
                }),
            }
        })
        .collect()
}

/// Parse a whole rotation stream into one matrix per view
pub fn parse_rotations(text: &str) -> Result<Vec<Mat3>, ParseError> {
    let rows = parse_triples(text)?;
    if rows.len() % 3 != 0 {
        return Err(ParseError::IncompleteRotation { lines: rows.len() });
    }
    Ok(rows
        .chunks_exact(3)
        .map(|rows| Mat3::from_rows(&[rows[0].transpose(), rows[1].transpose(), rows[2].transpose()]))
        .collect())
}

/// Parse a whole translation stream into one vector per view
pub fn parse_translations(text: &str) -> Result<Vec<Vec3>, ParseError> {
    parse_triples(text)
}

/// Parse matching rotation and translation streams into records
pub fn parse_records(rotation: &str, translation: &str) -> Result<Vec<ExtrinsicRecord>, ParseError> {
    let rotations = parse_rotations(rotation)?;
    let translations = parse_translations(translation)?;
    if rotations.len() != translations.len() {
        return Err(ParseError::CountMismatch {
            rotations: rotations.len(),
            translations: translations.len(),
        });
    }
    Ok(rotations
        .into_iter()
        .zip(translations)
        .map(|(rotation, translation)| ExtrinsicRecord { rotation, translation })
        .collect())
}

/// Read `R_matrix.txt` and `T_matrix.txt` from a scene directory
pub fn read_records(scene_dir: &Path) -> CaptureResult<Vec<ExtrinsicRecord>> {
    let rotation_path = scene_dir.join(ROTATION_FILE);
    let translation_path = scene_dir.join(TRANSLATION_FILE);
    let rotation = std::fs::read_to_string(&rotation_path).map_err(CaptureError::io(&rotation_path))?;
    let translation = std::fs::read_to_string(&translation_path).map_err(CaptureError::io(&translation_path))?;

    let rotations = parse_rotations(&rotation).map_err(CaptureError::parse(&rotation_path))?;
    let translations = parse_translations(&translation).map_err(CaptureError::parse(&translation_path))?;
    if rotations.len() != translations.len() {
        return Err(CaptureError::parse(scene_dir)(ParseError::CountMismatch {
            rotations: rotations.len(),
            translations: translations.len(),
        }));
    }

    Ok(rotations
        .into_iter()
        .zip(translations)
        .map(|(rotation, translation)| ExtrinsicRecord { rotation, translation })
        .collect())
}

/// Append-only writer for the rotation and translation streams of one scene
///
/// Both streams advance together: a record is formatted in full before either
/// stream is touched, and a successful `append` writes it to both. A failed
/// `append` leaves the streams in an undefined state; the error is fatal for
/// the scene.
pub struct ExtrinsicsWriter<W: Write> {
    rotation: W,
    translation: W,
    rotation_path: PathBuf,
    translation_path: PathBuf,
    records: usize,
}

impl ExtrinsicsWriter<BufWriter<File>> {
    /// Create (truncating) the rotation and translation files in `scene_dir`
    pub fn create(scene_dir: &Path) -> CaptureResult<Self> {
        let rotation_path = scene_dir.join(ROTATION_FILE);
        let translation_path = scene_dir.join(TRANSLATION_FILE);
        let rotation = File::create(&rotation_path).map_err(CaptureError::io(&rotation_path))?;
        let translation = File::create(&translation_path).map_err(CaptureError::io(&translation_path))?;

        Ok(Self {
            rotation: BufWriter::new(rotation),
            translation: BufWriter::new(translation),
            rotation_path,
            translation_path,
            records: 0,
        })
    }
}

impl<W: Write> ExtrinsicsWriter<W> {
    /// Wrap two arbitrary sinks
    pub fn new(rotation: W, translation: W) -> Self {
        Self {
            rotation,
            translation,
            rotation_path: PathBuf::from(ROTATION_FILE),
            translation_path: PathBuf::from(TRANSLATION_FILE),
            records: 0,
        }
    }

    /// Append one record to both streams
    pub fn append(&mut self, record: &ExtrinsicRecord) -> CaptureResult<()> {
        let (rotation, translation) = format_record(record);
        self.rotation
            .write_all(rotation.as_bytes())
            .map_err(CaptureError::io(&self.rotation_path))?;
        self.translation
            .write_all(translation.as_bytes())
            .map_err(CaptureError::io(&self.translation_path))?;
        self.records += 1;
        Ok(())
    }

    /// Number of records appended so far
    pub fn records_written(&self) -> usize {
        self.records
    }

    /// Flush both streams
    pub fn flush(&mut self) -> CaptureResult<()> {
        self.rotation.flush().map_err(CaptureError::io(&self.rotation_path))?;
        self.translation.flush().map_err(CaptureError::io(&self.translation_path))
    }

    /// Flush and hand back the underlying sinks
    pub fn finish(mut self) -> CaptureResult<(W, W)> {
        self.flush()?;
        Ok((self.rotation, self.translation))
    }
}
