//! Filter engine: campaign/channel inclusion over a borrowed dataset.

use crate::store::Dataset;
use marketing_core::Record;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Campaigns and channels currently selected. A record passes only when both
/// its campaign and its channel are selected; an empty set selects nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub allowed_campaigns: BTreeSet<String>,
    pub allowed_channels: BTreeSet<String>,
}

impl FilterSpec {
    pub fn new<C, H>(campaigns: C, channels: H) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
        H: IntoIterator,
        H::Item: Into<String>,
    {
        Self {
            allowed_campaigns: campaigns.into_iter().map(Into::into).collect(),
            allowed_channels: channels.into_iter().map(Into::into).collect(),
        }
    }

    /// Every campaign and channel present in `dataset`.
    pub fn select_all(dataset: &Dataset) -> Self {
        Self::new(dataset.campaigns(), dataset.channels())
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.allowed_campaigns.contains(&record.campaign)
            && self.allowed_channels.contains(&record.channel)
    }
}

/// Records of a [`Dataset`] that pass a [`FilterSpec`], in dataset order.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    records: Vec<&'a Record>,
}

impl<'a> FilteredView<'a> {
    pub fn records(&self) -> &[&'a Record] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Record> + '_ {
        self.records.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> FromIterator<&'a Record> for FilteredView<'a> {
    fn from_iter<I: IntoIterator<Item = &'a Record>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

pub fn filter<'a>(dataset: &'a Dataset, spec: &FilterSpec) -> FilteredView<'a> {
    let view: FilteredView<'a> = dataset.records().iter().filter(|r| spec.matches(r)).collect();
    debug!(
        campaigns = spec.allowed_campaigns.len(),
        channels = spec.allowed_channels.len(),
        matched = view.len(),
        total = dataset.len(),
        "Filter applied"
    );
    view
}
