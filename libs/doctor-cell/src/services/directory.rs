use std::sync::Arc;

use shared_store::records::DurationBucket;
use shared_store::AccountStore;

use crate::models::{DoctorCard, DoctorError, SortCriteria};

const DIRECTORY_CAP: usize = 30;

pub struct DirectoryService {
    store: Arc<dyn AccountStore>,
}

impl DirectoryService {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    /// Unfiltered directory listing, capped.
    pub async fn list(&self) -> Result<Vec<DoctorCard>, DoctorError> {
        let practitioners = self.store.list_practitioners().await?;
        Ok(practitioners
            .iter()
            .take(DIRECTORY_CAP)
            .map(DoctorCard::from)
            .collect())
    }

    /// Filtered and sorted listing. `criteria` narrows by language/help tags
    /// and an exclusive price range on one duration bucket; the result is
    /// ordered by that bucket's rate. Practitioners who have zeroed out
    /// their workday window are not taking appointments and are skipped.
    pub async fn search(
        &self,
        criteria: SortCriteria,
        order: &str,
    ) -> Result<Vec<DoctorCard>, DoctorError> {
        let descending = match order {
            "asc" => false,
            "desc" => true,
            _ => return Err(DoctorError::InvalidSortOrder),
        };

        let price_bucket = match (criteria.appointment_length.first(), criteria.price.len()) {
            (Some(&minutes), 2) => Some((
                DurationBucket::from_minutes(minutes).ok_or(DoctorError::InvalidSortCriteria)?,
                criteria.price[0],
                criteria.price[1],
            )),
            _ => None,
        };
        let sort_bucket = criteria
            .appointment_length
            .first()
            .and_then(|&m| DurationBucket::from_minutes(m))
            .unwrap_or(DurationBucket::Hour);

        let mut matched: Vec<_> = self
            .store
            .list_practitioners()
            .await?
            .into_iter()
            .filter(|p| !p.workday_hours.is_zeroed())
            .filter(|p| {
                criteria.language_options.is_empty()
                    || p.language_options
                        .iter()
                        .any(|l| criteria.language_options.contains(l))
            })
            .filter(|p| {
                criteria.help_options.is_empty()
                    || p.help_options
                        .iter()
                        .any(|h| criteria.help_options.contains(h))
            })
            .filter(|p| match price_bucket {
                Some((bucket, min, max)) => {
                    let rate = p.rates.rate(bucket);
                    rate > min && rate < max
                }
                None => true,
            })
            .collect();

        matched.sort_by_key(|p| p.rates.rate(sort_bucket));
        if descending {
            matched.reverse();
        }

        Ok(matched
            .iter()
            .take(DIRECTORY_CAP)
            .map(DoctorCard::from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_store::memory::MemoryStore;
    use shared_store::records::{HourWindow, PractitionerRecord, RateTable};

    async fn store_with(records: Vec<PractitionerRecord>) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        for record in records {
            store.create_practitioner(record).await.unwrap();
        }
        store
    }

    fn doctor(id: &str, half_rate: i64, languages: &[&str], help: &[&str]) -> PractitionerRecord {
        let mut record = PractitionerRecord::new(
            id.to_string(),
            format!("Dr {id}"),
            format!("{id}@clinic.test"),
            "hash".to_string(),
            "tok".to_string(),
        );
        record.rates = RateTable {
            quarter: half_rate / 2,
            half: half_rate,
            three_quarter: half_rate + 500,
            hour: half_rate * 2,
        };
        record.language_options = languages.iter().map(|s| s.to_string()).collect();
        record.help_options = help.iter().map(|s| s.to_string()).collect();
        record
    }

    #[tokio::test]
    async fn search_filters_by_language() {
        let store = store_with(vec![
            doctor("d1", 2000, &["en"], &["anxiety"]),
            doctor("d2", 3000, &["de"], &["anxiety"]),
        ])
        .await;
        let service = DirectoryService::new(store);

        let criteria = SortCriteria {
            language_options: vec!["en".to_string()],
            ..SortCriteria::default()
        };
        let cards = service.search(criteria, "asc").await.unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].user_id, "d1");
    }

    #[tokio::test]
    async fn search_orders_by_bucket_rate() {
        let store = store_with(vec![
            doctor("cheap", 1000, &[], &[]),
            doctor("steep", 5000, &[], &[]),
        ])
        .await;
        let service = DirectoryService::new(store);

        let asc = service
            .search(
                SortCriteria {
                    appointment_length: vec![30],
                    ..SortCriteria::default()
                },
                "asc",
            )
            .await
            .unwrap();
        assert_eq!(asc[0].user_id, "cheap");

        let desc = service
            .search(
                SortCriteria {
                    appointment_length: vec![30],
                    ..SortCriteria::default()
                },
                "desc",
            )
            .await
            .unwrap();
        assert_eq!(desc[0].user_id, "steep");
    }

    #[tokio::test]
    async fn price_range_is_exclusive() {
        let store = store_with(vec![
            doctor("inside", 2000, &[], &[]),
            doctor("edge", 3000, &[], &[]),
        ])
        .await;
        let service = DirectoryService::new(store);

        let cards = service
            .search(
                SortCriteria {
                    appointment_length: vec![30],
                    price: vec![1000, 3000],
                    ..SortCriteria::default()
                },
                "asc",
            )
            .await
            .unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].user_id, "inside");
    }

    #[tokio::test]
    async fn zeroed_workday_window_is_hidden_from_search() {
        let mut hidden = doctor("hidden", 2000, &[], &[]);
        hidden.workday_hours = HourWindow { from: 0, to: 0 };
        let store = store_with(vec![hidden, doctor("open", 2000, &[], &[])]).await;
        let service = DirectoryService::new(store);

        let cards = service.search(SortCriteria::default(), "asc").await.unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].user_id, "open");
    }

    #[tokio::test]
    async fn bad_order_is_rejected() {
        let store = store_with(vec![]).await;
        let service = DirectoryService::new(store);
        assert!(matches!(
            service.search(SortCriteria::default(), "sideways").await,
            Err(DoctorError::InvalidSortOrder)
        ));
    }
}
