use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One observed marketing period for a campaign on a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub date: NaiveDate,
    pub campaign: String,
    pub channel: String,
    pub segment: String,
    pub region: String,
    pub revenue: f64,
    pub cost: f64,
    pub conversions: u64,
    /// Percentage in `[0, 100]`.
    pub click_through_rate: f64,
    /// Percentage, negative when a period lost money.
    pub return_on_investment: f64,
}

impl Record {
    /// Categorical value of this record for `dimension`. `None` for
    /// [`Dimension::Date`], which is not a label.
    pub fn label(&self, dimension: Dimension) -> Option<&str> {
        match dimension {
            Dimension::Campaign => Some(&self.campaign),
            Dimension::Channel => Some(&self.channel),
            Dimension::Segment => Some(&self.segment),
            Dimension::Region => Some(&self.region),
            Dimension::Date => None,
        }
    }

    /// Owned group key of this record for `dimension`.
    pub fn key(&self, dimension: Dimension) -> GroupKey {
        match self.label(dimension) {
            Some(label) => GroupKey::Label(label.to_string()),
            None => GroupKey::Date(self.date),
        }
    }

    pub fn value(&self, field: Field) -> f64 {
        match field {
            Field::Revenue => self.revenue,
            Field::Cost => self.cost,
            Field::Conversions => self.conversions as f64,
            Field::ClickThroughRate => self.click_through_rate,
            Field::ReturnOnInvestment => self.return_on_investment,
        }
    }
}

/// Value of a grouping attribute: a categorical label or a calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum GroupKey {
    Label(String),
    Date(NaiveDate),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Label(label) => f.write_str(label),
            Self::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

impl From<&str> for GroupKey {
    fn from(label: &str) -> Self {
        Self::Label(label.to_string())
    }
}

impl From<NaiveDate> for GroupKey {
    fn from(date: NaiveDate) -> Self {
        Self::Date(date)
    }
}

/// Attribute a table can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Campaign,
    Channel,
    Date,
    Segment,
    Region,
}

impl Dimension {
    pub const ALL: [Dimension; 5] = [
        Dimension::Campaign,
        Dimension::Channel,
        Dimension::Date,
        Dimension::Segment,
        Dimension::Region,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Campaign => "campaign",
            Self::Channel => "channel",
            Self::Date => "date",
            Self::Segment => "segment",
            Self::Region => "region",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown dimension `{s}`"))
    }
}

/// Numeric attribute of a [`Record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Revenue,
    Cost,
    Conversions,
    ClickThroughRate,
    ReturnOnInvestment,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Revenue,
        Field::Cost,
        Field::Conversions,
        Field::ClickThroughRate,
        Field::ReturnOnInvestment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Revenue => "revenue",
            Self::Cost => "cost",
            Self::Conversions => "conversions",
            Self::ClickThroughRate => "click_through_rate",
            Self::ReturnOnInvestment => "return_on_investment",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "ctr" => return Ok(Self::ClickThroughRate),
            "roi" => return Ok(Self::ReturnOnInvestment),
            _ => {}
        }
        Self::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown field `{s}`"))
    }
}
