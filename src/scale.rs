use crate::dataset::Dataset;

/// Per-column min-max normalization to [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct MinMaxScaler {
    min: Vec<f64>,
    range: Vec<f64>,
}

impl MinMaxScaler {
    pub fn fit(data: &Dataset) -> Self {
        let n = data.n_features();
        let mut min = vec![f64::INFINITY; n];
        let mut max = vec![f64::NEG_INFINITY; n];
        for row in &data.rows {
            for (c, &v) in row.iter().enumerate() {
                min[c] = min[c].min(v);
                max[c] = max[c].max(v);
            }
        }
        let range = min
            .iter()
            .zip(&max)
            .map(|(lo, hi)| {
                let r = hi - lo;
                // constant column: every value maps to 0
                if r > 0.0 && r.is_finite() {
                    r
                } else {
                    1.0
                }
            })
            .collect();
        Self { min, range }
    }

    pub fn transform(&self, data: &Dataset) -> Dataset {
        let rows = data
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .map(|(c, v)| (v - self.min[c]) / self.range[c])
                    .collect()
            })
            .collect();
        Dataset {
            columns: data.columns.clone(),
            rows,
            labels: data.labels.clone(),
        }
    }

    pub fn fit_transform(data: &Dataset) -> Dataset {
        Self::fit(data).transform(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_into_unit_interval() {
        let data = Dataset::new(
            vec!["age".into(), "flag".into()],
            vec![vec![10.0, 1.0], vec![30.0, 1.0], vec![20.0, 1.0]],
            vec![0, 1, 0],
        )
        .unwrap();
        let scaled = MinMaxScaler::fit_transform(&data);
        assert_eq!(scaled.column_values(0), vec![0.0, 1.0, 0.5]);
        assert_eq!(scaled.column_values(1), vec![0.0, 0.0, 0.0]);
        assert_eq!(scaled.labels, data.labels);
    }
}
