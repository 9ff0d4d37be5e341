use std::collections::BTreeMap;

use tracing::{debug, instrument, warn};

use crate::idt_pipeline::common::error::{IdtError, Result, Stage};
use crate::idt_pipeline::exposure::key::{ExposureValue, parse_exposure_key};
use crate::idt_pipeline::sampler::{RawSample, SamplerOutput};

/// A provided key replaced by a later key normalising to the same EV.
#[derive(Debug, Clone, PartialEq)]
pub struct Overwrite {
    pub ev: ExposureValue,
    pub replaced: String,
    pub kept: String,
}

/// What the merge did with the provided keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeReport {
    /// Surviving `(key, EV)` pairs in ascending EV order
    pub accepted: Vec<(String, ExposureValue)>,
    pub overwritten: Vec<Overwrite>,
}

/// Checker samples keyed by unique, ascending EV.
#[derive(Debug, Clone, PartialEq)]
pub struct ExposureSeries {
    exposures: Vec<(ExposureValue, Vec<RawSample>)>,
    grey_card: Option<RawSample>,
}

impl ExposureSeries {
    pub fn exposure_values(&self) -> impl Iterator<Item = ExposureValue> + '_ {
        self.exposures.iter().map(|(ev, _)| *ev)
    }

    pub fn len(&self) -> usize {
        self.exposures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exposures.is_empty()
    }

    pub fn patch_count(&self) -> usize {
        self.exposures.first().map_or(0, |(_, patches)| patches.len())
    }

    /// Samples of the exposure matching `ev` in stops, if captured.
    pub fn patches_at(&self, ev: f64) -> Option<&[RawSample]> {
        let target = ExposureValue::new(ev).ok()?;
        self.exposures
            .binary_search_by(|(candidate, _)| candidate.cmp(&target))
            .ok()
            .map(|i| self.exposures[i].1.as_slice())
    }

    /// Ascending `(EV, sample)` sequence of one patch.
    pub fn patch_series(&self, patch: usize) -> Vec<(ExposureValue, &RawSample)> {
        self.exposures
            .iter()
            .filter_map(|(ev, patches)| patches.get(patch).map(|sample| (*ev, sample)))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ExposureValue, &[RawSample])> + '_ {
        self.exposures
            .iter()
            .map(|(ev, patches)| (*ev, patches.as_slice()))
    }

    pub fn grey_card(&self) -> Option<&RawSample> {
        self.grey_card.as_ref()
    }
}

/// Turns sampler output into an [`ExposureSeries`].
///
/// When two keys normalise to the same EV the later one wins, in the order
/// the keys were provided.
pub struct ExposureSorter;

impl ExposureSorter {
    #[instrument(skip_all, fields(captures = output.captures.len()))]
    pub fn merge(output: SamplerOutput) -> Result<(ExposureSeries, MergeReport)> {
        if output.captures.is_empty() {
            return Err(IdtError::InsufficientSamples {
                stage: Stage::Sorter,
                context: String::from("colour checker exposures"),
                valid: 0,
                required: 1,
            });
        }

        let mut by_ev: BTreeMap<ExposureValue, (String, Vec<RawSample>)> = BTreeMap::new();
        let mut overwritten = Vec::new();

        for capture in output.captures {
            let ev = parse_exposure_key(&capture.key)?;
            debug!(key = %capture.key, %ev, "Parsed exposure key");
            if let Some((replaced, _)) = by_ev.insert(ev, (capture.key.clone(), capture.patches)) {
                warn!(
                    %ev,
                    replaced = %replaced,
                    kept = %capture.key,
                    "Duplicate exposure, keeping the later capture"
                );
                overwritten.push(Overwrite {
                    ev,
                    replaced,
                    kept: capture.key,
                });
            }
        }

        let mut accepted = Vec::with_capacity(by_ev.len());
        let mut exposures = Vec::with_capacity(by_ev.len());
        for (ev, (key, patches)) in by_ev {
            accepted.push((key, ev));
            exposures.push((ev, patches));
        }

        let patch_count = exposures[0].1.len();
        if let Some((ev, patches)) = exposures.iter().find(|(_, p)| p.len() != patch_count) {
            return Err(IdtError::InsufficientSamples {
                stage: Stage::Sorter,
                context: format!("patches at exposure {ev}"),
                valid: patches.len(),
                required: patch_count,
            });
        }

        Ok((
            ExposureSeries {
                exposures,
                grey_card: output.grey_card,
            },
            MergeReport {
                accepted,
                overwritten,
            },
        ))
    }
}
