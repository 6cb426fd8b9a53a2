use chrono::NaiveDate;
use marketing_core::{Dimension, Field, Record};
use marketing_reporting::{
    aggregate_by, best_key, filter, total, Dataset, FilterSpec, Insights, MetricSpec,
};
use proptest::prelude::*;
use std::collections::BTreeSet;

const CAMPAIGNS: [&str; 4] = ["Spring", "Summer", "Autumn", "Winter"];
const CHANNELS: [&str; 3] = ["Email", "Social", "Search"];
const SEGMENTS: [&str; 3] = ["Young", "Adult", "Senior"];
const REGIONS: [&str; 4] = ["North", "South", "East", "West"];

fn record_strategy() -> impl Strategy<Value = Record> {
    (
        0usize..CAMPAIGNS.len(),
        0usize..CHANNELS.len(),
        0usize..SEGMENTS.len(),
        0usize..REGIONS.len(),
        1u32..=28,
        0u32..100_000,
        0u32..100_000,
        0u64..500,
        0u32..=100,
        -100i32..1000,
    )
        .prop_map(|(c, h, s, r, day, revenue, cost, conversions, ctr, roi)| Record {
            date: NaiveDate::from_ymd_opt(2024, 2, day).unwrap(),
            campaign: CAMPAIGNS[c].into(),
            channel: CHANNELS[h].into(),
            segment: SEGMENTS[s].into(),
            region: REGIONS[r].into(),
            // Quarter-unit amounts keep sums exact in f64.
            revenue: f64::from(revenue) / 4.0,
            cost: f64::from(cost) / 4.0,
            conversions,
            click_through_rate: f64::from(ctr),
            return_on_investment: f64::from(roi),
        })
}

fn dataset_strategy() -> impl Strategy<Value = Dataset> {
    prop::collection::vec(record_strategy(), 0..60).prop_map(|records| Dataset::new("prop", records))
}

fn spec_strategy() -> impl Strategy<Value = FilterSpec> {
    (
        prop::sample::subsequence(CAMPAIGNS.to_vec(), 0..=CAMPAIGNS.len()),
        prop::sample::subsequence(CHANNELS.to_vec(), 0..=CHANNELS.len()),
    )
        .prop_map(|(campaigns, channels)| FilterSpec::new(campaigns, channels))
}

fn dimension_strategy() -> impl Strategy<Value = Dimension> {
    prop::sample::select(Dimension::ALL.to_vec())
}

proptest! {
    #[test]
    fn filter_is_exact_conjunction(data in dataset_strategy(), spec in spec_strategy()) {
        let view = filter(&data, &spec);
        for r in view.iter() {
            prop_assert!(spec.allowed_campaigns.contains(&r.campaign));
            prop_assert!(spec.allowed_channels.contains(&r.channel));
        }
        let expected = data
            .records()
            .iter()
            .filter(|r| spec.allowed_campaigns.contains(&r.campaign)
                && spec.allowed_channels.contains(&r.channel))
            .count();
        prop_assert_eq!(view.len(), expected);
    }

    #[test]
    fn empty_campaign_set_selects_nothing(data in dataset_strategy()) {
        let spec = FilterSpec::new(Vec::<String>::new(), CHANNELS);
        prop_assert!(filter(&data, &spec).is_empty());
    }

    #[test]
    fn group_sums_add_up_to_total(
        data in dataset_strategy(),
        spec in spec_strategy(),
        dimension in dimension_strategy(),
    ) {
        let view = filter(&data, &spec);
        for field in [Field::Revenue, Field::Cost, Field::Conversions] {
            let metric = MetricSpec::sum(field);
            let table = aggregate_by(&view, dimension, &[metric]);
            let grouped: f64 = table.rows().iter().map(|r| r.values[0]).sum();
            prop_assert_eq!(grouped, total(&view, field));
        }
    }

    #[test]
    fn keys_are_exactly_present_values(
        data in dataset_strategy(),
        spec in spec_strategy(),
        dimension in dimension_strategy(),
    ) {
        let view = filter(&data, &spec);
        let table = aggregate_by(&view, dimension, &[MetricSpec::mean(Field::ReturnOnInvestment)]);
        let present: BTreeSet<_> = view.iter().map(|r| r.key(dimension)).collect();
        let keys: BTreeSet<_> = table.keys().cloned().collect();
        prop_assert_eq!(keys, present);
        let members: usize = table.rows().iter().map(|r| r.count).sum();
        prop_assert_eq!(members, view.len());
        for row in table.rows() {
            prop_assert!(row.count >= 1);
            prop_assert!(!row.values[0].is_nan());
        }
    }

    #[test]
    fn pipeline_is_idempotent(data in dataset_strategy(), spec in spec_strategy()) {
        let run = || {
            let view = filter(&data, &spec);
            let revenue = MetricSpec::sum(Field::Revenue);
            let table = aggregate_by(&view, Dimension::Campaign, &[revenue]);
            let best = best_key(&table, &revenue.into()).ok().cloned();
            (table, best, Insights::compute(&view).ok())
        };
        prop_assert_eq!(run(), run());
    }

    #[test]
    fn best_key_holds_the_maximum(data in dataset_strategy(), dimension in dimension_strategy()) {
        let spec = FilterSpec::select_all(&data);
        let view = filter(&data, &spec);
        let metric = MetricSpec::sum(Field::Conversions);
        let table = aggregate_by(&view, dimension, &[metric]);
        match best_key(&table, &metric.into()) {
            Ok(key) => {
                let best = table.get(key).unwrap().values[0];
                let first_max = table
                    .rows()
                    .iter()
                    .find(|r| r.values[0] == best)
                    .map(|r| &r.key);
                prop_assert!(table.rows().iter().all(|r| r.values[0] <= best));
                prop_assert_eq!(first_max, Some(key));
            }
            Err(e) => {
                prop_assert!(e.is_empty_table());
                prop_assert!(view.is_empty());
            }
        }
    }
}
