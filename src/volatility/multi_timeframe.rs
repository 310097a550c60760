//! Multi-timeframe (cross-horizon) volatility analysis

use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};
use crate::{
    config::{
        Config, MIN_GROWTH_RECORDS, MIN_PROPAGATION_ROWS, MIN_SCALING_HORIZONS,
        MIN_SCALING_RECORDS, SCALING_LINEAR_TOLERANCE,
    },
    types::{
        CorrelationMatrix, GrowthPattern, GrowthStep, HorizonSummary, PropagationEffect,
        ScaleObservation, ScaleRatio, ScaleRatioRow, ScalingProperty, ScalingRegime,
    },
    utils::{linear_regression, mean, median, min_max, pearson, quantile_sorted, sample_std, sorted},
};

pub struct MultiscaleAnalyzer {
    horizons: Vec<u32>,
    reference_minutes: u32,
}

impl MultiscaleAnalyzer {
    pub fn new(horizons: &[u32], reference_minutes: u32) -> Self {
        let mut horizons = horizons.to_vec();
        horizons.sort_unstable();
        horizons.dedup();
        Self {
            horizons,
            reference_minutes,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let analyzer = Self::new(&config.post_window_minutes, config.reference_scale_minutes);
        if !analyzer.horizons.contains(&analyzer.reference_minutes) {
            warn!(
                reference = analyzer.reference_minutes,
                horizons = ?analyzer.horizons,
                "Reference scale is not a configured post window; scale ratios will be missing"
            );
        }
        analyzer
    }

    pub fn horizons(&self) -> &[u32] {
        &self.horizons
    }

    pub fn reference_minutes(&self) -> u32 {
        self.reference_minutes
    }

    /// Every non-reference horizon divided by the reference horizon, per event.
    pub fn scale_ratios(&self, observations: &[ScaleObservation]) -> Vec<ScaleRatioRow> {
        observations
            .iter()
            .map(|obs| {
                let reference = obs
                    .movement(self.reference_minutes)
                    .filter(|&r| r != 0.0);
                let ratios = self
                    .horizons
                    .iter()
                    .filter(|&&h| h != self.reference_minutes)
                    .map(|&h| {
                        let ratio = match (obs.movement(h), reference) {
                            (Some(m), Some(r)) => Some(m / r),
                            _ => None,
                        };
                        ScaleRatio {
                            horizon_minutes: h,
                            reference_minutes: self.reference_minutes,
                            ratio,
                            log_ratio: ratio.filter(|&r| r > 0.0).map(f64::ln),
                        }
                    })
                    .collect();

                ScaleRatioRow {
                    event_index: obs.event_index,
                    currency: obs.currency.clone(),
                    event_name: obs.event_name.clone(),
                    ratios,
                }
            })
            .collect()
    }

    /// Pairwise-complete Pearson matrix; mirrored so `[i][j] == [j][i]`.
    pub fn scale_correlations(&self, observations: &[ScaleObservation]) -> CorrelationMatrix {
        let n = self.horizons.len();
        let mut values = vec![vec![None; n]; n];

        for i in 0..n {
            for j in i..n {
                let (xs, ys) = paired(observations, self.horizons[i], self.horizons[j], |_| true);
                let r = pearson(&xs, &ys).ok();
                values[i][j] = r;
                values[j][i] = r;
            }
        }

        CorrelationMatrix {
            horizons: self.horizons.clone(),
            values,
        }
    }

    /// Correlation, mean ratio and regression of each horizon on its shorter neighbour.
    pub fn propagation_effects(&self, observations: &[ScaleObservation]) -> Vec<PropagationEffect> {
        let mut effects = Vec::new();

        for pair in self.horizons.windows(2) {
            let (short, long) = (pair[0], pair[1]);
            let (xs, ys) = paired(observations, short, long, |x| x != 0.0);
            if xs.len() < MIN_PROPAGATION_ROWS {
                debug!(
                    from = short,
                    to = long,
                    rows = xs.len(),
                    "Skipping propagation pair with too few rows"
                );
                continue;
            }

            let ratios: Vec<f64> = xs.iter().zip(&ys).map(|(x, y)| y / x).collect();
            effects.push(PropagationEffect {
                from_minutes: short,
                to_minutes: long,
                sample_count: xs.len(),
                correlation: pearson(&xs, &ys).ok(),
                mean_ratio: mean(&ratios),
                regression: linear_regression(&xs, &ys).ok(),
            });
        }

        effects
    }

    /// Log-log fit of mean movement against horizon per (currency, event).
    pub fn scaling_properties(&self, observations: &[ScaleObservation]) -> Vec<ScalingProperty> {
        let mut properties = Vec::new();

        for ((currency, event_name), group) in group_by_indicator(observations) {
            if group.len() < MIN_SCALING_RECORDS {
                continue;
            }

            let mean_movements: BTreeMap<u32, f64> = self
                .horizons
                .iter()
                .filter_map(|&h| {
                    let values: Vec<f64> = group.iter().filter_map(|o| o.movement(h)).collect();
                    mean(&values).map(|m| (h, m))
                })
                .collect();

            // the power law is only defined on positive means
            let usable: Vec<(f64, f64)> = mean_movements
                .iter()
                .filter(|(_, m)| **m > 0.0)
                .map(|(&h, &m)| (f64::from(h).ln(), m.ln()))
                .collect();
            if usable.len() < MIN_SCALING_HORIZONS {
                continue;
            }

            let (log_h, log_m): (Vec<f64>, Vec<f64>) = usable.into_iter().unzip();
            match linear_regression(&log_h, &log_m) {
                Ok(fit) => properties.push(ScalingProperty {
                    currency: currency.to_string(),
                    event_name: event_name.to_string(),
                    record_count: group.len(),
                    horizon_count: fit.n,
                    scaling_exponent: fit.slope,
                    intercept: fit.intercept,
                    r_squared: fit.r_squared,
                    p_value: fit.p_value,
                    regime: ScalingRegime::from_exponent(fit.slope, SCALING_LINEAR_TOLERANCE),
                    mean_movements,
                }),
                Err(e) => debug!(currency, event = event_name, error = %e, "Scaling fit skipped"),
            }
        }

        info!(indicators = properties.len(), "Computed scaling properties");
        properties
    }

    /// Distribution of movement per horizon; horizons with fewer than two values are skipped.
    pub fn compare_horizons(&self, observations: &[ScaleObservation]) -> Vec<HorizonSummary> {
        self.horizons
            .iter()
            .filter_map(|&h| {
                let values: Vec<f64> = observations.iter().filter_map(|o| o.movement(h)).collect();
                if values.len() < 2 {
                    debug!(horizon = h, "Insufficient data for horizon comparison");
                    return None;
                }
                let ordered = sorted(&values);
                let (min, max) = min_max(&values)?;
                Some(HorizonSummary {
                    horizon_minutes: h,
                    count: values.len(),
                    mean: mean(&values)?,
                    median: median(&values)?,
                    std: sample_std(&values)?,
                    min,
                    max,
                    q25: quantile_sorted(&ordered, 0.25)?,
                    q75: quantile_sorted(&ordered, 0.75)?,
                    q90: quantile_sorted(&ordered, 0.9)?,
                })
            })
            .collect()
    }

    pub fn growth_patterns(&self, observations: &[ScaleObservation]) -> Vec<GrowthPattern> {
        group_by_indicator(observations)
            .into_iter()
            .filter(|(_, group)| group.len() >= MIN_GROWTH_RECORDS)
            .map(|((currency, event_name), group)| {
                let means: Vec<Option<f64>> = self
                    .horizons
                    .iter()
                    .map(|&h| {
                        let values: Vec<f64> = group.iter().filter_map(|o| o.movement(h)).collect();
                        mean(&values)
                    })
                    .collect();
                let first = means.first().copied().flatten();

                let steps = self
                    .horizons
                    .iter()
                    .enumerate()
                    .map(|(i, &h)| {
                        let current = means[i];
                        let (growth_rate, cumulative_growth) = if i == 0 {
                            (current.map(|_| 1.0), current.map(|_| 1.0))
                        } else {
                            let step = match (current, means[i - 1]) {
                                (Some(c), Some(p)) if p != 0.0 => Some(c / p),
                                _ => None,
                            };
                            let cumulative = match (current, first) {
                                (Some(c), Some(f)) if f > 0.0 => Some(c / f),
                                _ => None,
                            };
                            (step, cumulative)
                        };
                        GrowthStep {
                            horizon_minutes: h,
                            mean_movement: current,
                            growth_rate,
                            cumulative_growth,
                        }
                    })
                    .collect();

                GrowthPattern {
                    currency: currency.to_string(),
                    event_name: event_name.to_string(),
                    record_count: group.len(),
                    steps,
                }
            })
            .collect()
    }
}

/// Rows where both horizons are present and the shorter passes `keep`.
fn paired<F>(observations: &[ScaleObservation], a: u32, b: u32, keep: F) -> (Vec<f64>, Vec<f64>)
where
    F: Fn(f64) -> bool,
{
    observations
        .iter()
        .filter_map(|o| Some((o.movement(a)?, o.movement(b)?)))
        .filter(|&(x, _)| keep(x))
        .unzip()
}

fn group_by_indicator(observations: &[ScaleObservation]) -> BTreeMap<(&str, &str), Vec<&ScaleObservation>> {
    let mut groups: BTreeMap<(&str, &str), Vec<&ScaleObservation>> = BTreeMap::new();
    for obs in observations {
        groups
            .entry((obs.currency.as_str(), obs.event_name.as_str()))
            .or_default()
            .push(obs);
    }
    groups
}

/// Horizons at which at least one observation has a movement.
pub fn observed_horizons(observations: &[ScaleObservation]) -> BTreeSet<u32> {
    observations
        .iter()
        .flat_map(|o| o.movements.keys().copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(index: usize, event: &str, movements: &[(u32, f64)]) -> ScaleObservation {
        ScaleObservation {
            event_index: index,
            currency: "USD".to_string(),
            event_name: event.to_string(),
            movements: movements.iter().copied().collect(),
        }
    }

    #[test]
    fn scale_ratios_against_reference() {
        let analyzer = MultiscaleAnalyzer::new(&[5, 15, 30], 15);
        let rows = analyzer.scale_ratios(&[obs(0, "CPI", &[(5, 2.0), (15, 4.0), (30, 6.0)])]);
        let row = &rows[0];
        assert_eq!(row.ratios.len(), 2);
        assert_eq!(row.ratio(5).unwrap().ratio, Some(0.5));
        let thirty = row.ratio(30).unwrap();
        assert_eq!(thirty.ratio, Some(1.5));
        assert!((thirty.log_ratio.unwrap() - 0.405465).abs() < 1e-6);
    }

    #[test]
    fn scale_ratios_missing_for_zero_or_absent_reference() {
        let analyzer = MultiscaleAnalyzer::new(&[5, 15, 30], 15);
        let rows = analyzer.scale_ratios(&[
            obs(0, "CPI", &[(5, 2.0), (15, 0.0), (30, 6.0)]),
            obs(1, "CPI", &[(5, 2.0), (30, 6.0)]),
            obs(2, "CPI", &[(5, 0.0), (15, 3.0)]),
        ]);
        assert_eq!(rows[0].ratio(5).unwrap().ratio, None);
        assert_eq!(rows[1].ratio(30).unwrap().ratio, None);
        let zero = rows[2].ratio(5).unwrap();
        assert_eq!(zero.ratio, Some(0.0));
        assert_eq!(zero.log_ratio, None);
        assert_eq!(rows[2].ratio(30).unwrap().ratio, None);
    }

    #[test]
    fn correlation_matrix_is_symmetric_and_pairwise() {
        let analyzer = MultiscaleAnalyzer::new(&[5, 15, 30], 15);
        let data = vec![
            obs(0, "CPI", &[(5, 1.0), (15, 2.0), (30, 3.5)]),
            obs(1, "CPI", &[(5, 2.0), (15, 4.5), (30, 5.0)]),
            obs(2, "CPI", &[(5, 3.0), (15, 5.0)]),
            obs(3, "CPI", &[(5, 4.0), (15, 8.5), (30, 9.0)]),
        ];
        let matrix = analyzer.scale_correlations(&data);
        for &a in analyzer.horizons() {
            for &b in analyzer.horizons() {
                assert_eq!(matrix.get(a, b), matrix.get(b, a));
            }
        }
        assert!((matrix.get(5, 5).unwrap() - 1.0).abs() < 1e-12);
        assert!(matrix.get(5, 15).unwrap() > 0.9);
    }

    #[test]
    fn propagation_needs_five_rows() {
        let analyzer = MultiscaleAnalyzer::new(&[5, 15, 30], 15);
        let mut data: Vec<ScaleObservation> = (0..5)
            .map(|i| {
                let x = 1.0 + i as f64;
                obs(i, "CPI", &[(5, x), (15, 2.0 * x + 1.0)])
            })
            .collect();
        data.push(obs(5, "CPI", &[(5, 0.0), (15, 3.0), (30, 4.0)]));

        let effects = analyzer.propagation_effects(&data);
        assert_eq!(effects.len(), 1);
        let effect = &effects[0];
        assert_eq!((effect.from_minutes, effect.to_minutes), (5, 15));
        // the zero-denominator row is dropped
        assert_eq!(effect.sample_count, 5);
        let fit = effect.regression.unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-9);
        assert!((fit.intercept - 1.0).abs() < 1e-9);
        assert!((effect.correlation.unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn scaling_exponent_from_power_law() {
        let analyzer = MultiscaleAnalyzer::new(&[5, 15, 30], 15);
        // movement = 0.1 * h^0.5
        let data: Vec<ScaleObservation> = (0..6)
            .map(|i| {
                obs(
                    i,
                    "CPI",
                    &[(5, 0.1 * 5f64.sqrt()), (15, 0.1 * 15f64.sqrt()), (30, 0.1 * 30f64.sqrt())],
                )
            })
            .chain((6..8).map(|i| obs(i, "GDP", &[(5, 1.0), (15, 2.0), (30, 3.0)])))
            .collect();

        let props = analyzer.scaling_properties(&data);
        assert_eq!(props.len(), 1);
        let cpi = &props[0];
        assert_eq!(cpi.event_name, "CPI");
        assert_eq!(cpi.record_count, 6);
        assert!((cpi.scaling_exponent - 0.5).abs() < 1e-9);
        assert!((cpi.intercept - 0.1f64.ln()).abs() < 1e-9);
        assert_eq!(cpi.regime, ScalingRegime::SubLinear);
    }

    #[test]
    fn horizon_comparison_and_growth() {
        let analyzer = MultiscaleAnalyzer::new(&[5, 15, 30], 15);
        let data = vec![
            obs(0, "CPI", &[(5, 1.0), (15, 2.0), (30, 4.0)]),
            obs(1, "CPI", &[(5, 2.0), (15, 4.0), (30, 8.0)]),
            obs(2, "CPI", &[(5, 3.0), (15, 6.0)]),
            obs(3, "PPI", &[(5, 3.0)]),
        ];
        let summary = analyzer.compare_horizons(&data);
        assert_eq!(summary.len(), 3);
        assert_eq!(summary[0].count, 4);
        assert_eq!(summary[0].q25, 1.75);
        assert_eq!(summary[2].count, 2);

        let growth = analyzer.growth_patterns(&data);
        assert_eq!(growth.len(), 1);
        let steps = &growth[0].steps;
        assert_eq!(steps[0].growth_rate, Some(1.0));
        assert_eq!(steps[1].mean_movement, Some(4.0));
        assert_eq!(steps[1].growth_rate, Some(2.0));
        assert_eq!(steps[2].growth_rate, Some(1.5));
        assert_eq!(steps[2].cumulative_growth, Some(3.0));

        assert_eq!(observed_horizons(&data).len(), 3);
    }
}
