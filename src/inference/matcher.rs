//! Nearest historical example within a cluster.

use std::collections::BTreeMap;

use super::artifacts::{HistoricalDataset, Row, CLUSTER_COLUMN};
use super::model::squared_distance;

/// Normalized features compared when looking for the closest real event.
pub const COMPARISON_FEATURES: [&str; 7] =
    ["mag", "depth", "latitude", "longitude", "sig", "cdi", "mmi"];

/// The closest historical event to a query.
#[derive(Debug, Clone, Copy)]
pub struct NearestExample<'a> {
    /// Row index shared by both dataset tables.
    pub index: usize,
    pub normalized: Row<'a>,
    pub original: Row<'a>,
    /// Euclidean distance in the comparison space.
    pub distance: f64,
}

pub struct NearestExampleMatcher<'a> {
    dataset: &'a HistoricalDataset,
}

impl<'a> NearestExampleMatcher<'a> {
    pub fn new(dataset: &'a HistoricalDataset) -> Self {
        Self { dataset }
    }

    /// Find the row of `cluster_id` closest to `normalized`.
    ///
    /// Returns `None` when the cluster has no rows, or when the query lacks a
    /// comparison feature.
    pub fn nearest(
        &self,
        cluster_id: usize,
        normalized: &BTreeMap<String, f64>,
    ) -> Option<NearestExample<'a>> {
        // ---
        let query = COMPARISON_FEATURES
            .iter()
            .map(|f| normalized.get(*f).copied())
            .collect::<Option<Vec<f64>>>()?;

        let clustered = &self.dataset.clustered;
        let cluster_col = clustered.column_index(CLUSTER_COLUMN)?;
        let columns = COMPARISON_FEATURES
            .iter()
            .map(|f| clustered.column_index(f))
            .collect::<Option<Vec<usize>>>()?;

        let (index, best) = clustered
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| in_cluster(row[cluster_col], cluster_id))
            .map(|(i, row)| {
                let point: Vec<f64> = columns.iter().map(|c| row[*c]).collect();
                (i, squared_distance(&query, &point))
            })
            .filter(|(_, d)| !d.is_nan())
            .min_by(|(_, a), (_, b)| a.total_cmp(b))?;

        Some(NearestExample {
            index,
            normalized: clustered.row(index)?,
            original: self.dataset.original.row(index)?,
            distance: best.sqrt(),
        })
    }
}

fn in_cluster(value: f64, cluster_id: usize) -> bool {
    value.is_finite() && value >= 0.0 && value.round() as usize == cluster_id
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::inference::artifacts::Table;

    fn dataset() -> HistoricalDataset {
        // ---
        let clustered = "mag,depth,latitude,longitude,sig,cdi,mmi,cluster\n\
                         0,0,0,0,0,0,0,0\n\
                         1,1,1,1,1,1,1,1\n\
                         3,0,0,0,0,0,0,1\n\
                         0.5,0,0,0,0,0,0,0\n";
        let original = "mag,depth,latitude,longitude,sig,cdi,mmi,alert\n\
                        4.5,10,1,1,300,2,3,0\n\
                        6.0,20,2,2,600,4,5,2\n\
                        7.5,30,3,3,900,6,7,4\n\
                        5.0,40,4,4,400,3,4,1\n";
        HistoricalDataset {
            clustered: Table::from_reader(clustered.as_bytes(), "clustered").unwrap(),
            original: Table::from_reader(original.as_bytes(), "original").unwrap(),
        }
    }

    fn query(value: f64) -> BTreeMap<String, f64> {
        COMPARISON_FEATURES
            .iter()
            .map(|f| (f.to_string(), value))
            .collect()
    }

    #[test]
    fn test_nearest_within_cluster() {
        // ---
        let data = dataset();
        let matcher = NearestExampleMatcher::new(&data);

        let mut q = query(0.0);
        q.insert("mag".to_string(), 0.4);
        let found = matcher.nearest(0, &q).unwrap();
        assert_eq!(found.index, 3);
        assert!((found.distance - 0.1).abs() < 1e-9);
        assert_eq!(found.original.get("mag"), Some(5.0));
        assert_eq!(found.normalized.get("cluster"), Some(0.0));

        // Row 2 is closer in absolute terms but belongs to cluster 1.
        let mut q = query(0.0);
        q.insert("mag".to_string(), 2.9);
        let found = matcher.nearest(1, &q).unwrap();
        assert_eq!(found.index, 2);
        let found = matcher.nearest(0, &q).unwrap();
        assert_eq!(found.index, 3);
    }

    #[test]
    fn test_empty_cluster_has_no_match() {
        // ---
        let data = dataset();
        let matcher = NearestExampleMatcher::new(&data);
        assert!(matcher.nearest(7, &query(0.0)).is_none());
    }

    #[test]
    fn test_incomplete_query_has_no_match() {
        // ---
        let data = dataset();
        let matcher = NearestExampleMatcher::new(&data);
        let mut q = query(0.0);
        q.remove("sig");
        assert!(matcher.nearest(0, &q).is_none());
    }
}
