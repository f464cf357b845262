//! Analytics aggregator.
//!
//! Reads one consistent snapshot of the catalog, borrower and ledger tables
//! (a single REPEATABLE READ transaction) and derives the whole dashboard
//! from it with pure functions. Nothing here writes; every number in one
//! dashboard comes from the same logical instant.
//!
//! Calendar bucketing is timezone-parameterized: production passes
//! `Local::now()` so day/week/month boundaries follow the system clock,
//! tests pass fixed UTC instants.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, TimeZone, Utc, Weekday};
use indexmap::IndexMap;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        borrower::{Borrower, BorrowerRole},
        item::Item,
        loan::{Loan, LoanKind},
    },
    repository::Repository,
};

/// Items with fewer available copies than this are reported as low stock
const LOW_STOCK_THRESHOLD: i32 = 2;
/// Utilization above this fraction marks an item as high demand
const HIGH_DEMAND_UTILIZATION: f64 = 0.8;
/// Ranking sizes
const TOP_BORROWERS: usize = 5;
const MOST_BORROWED: usize = 10;
const LEAST_BORROWED: usize = 5;
/// Length of the trailing daily activity series
const ACTIVITY_WINDOW_DAYS: i64 = 7;

/// Point-in-time copy of the working set all dashboard numbers derive from
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub items: Vec<Item>,
    pub borrowers: Vec<Borrower>,
    pub loans: Vec<Loan>,
}

/// The five-section dashboard
#[derive(Debug, Serialize, ToSchema)]
pub struct Dashboard {
    pub generated_at: DateTime<Utc>,
    pub borrowers: BorrowerAnalytics,
    pub items: ItemAnalytics,
    pub loans: LoanAnalytics,
    pub inventory: InventoryAnalytics,
    pub system_health: SystemHealth,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BorrowerAnalytics {
    pub total: i64,
    /// Distinct borrowers holding at least one open loan
    pub active: i64,
    pub new_this_month: i64,
    /// Month-over-month growth of new registrations, percent
    pub growth_rate: f64,
    #[schema(value_type = Object)]
    pub by_role: IndexMap<String, i64>,
    pub top_borrowers: Vec<BorrowerActivity>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BorrowerActivity {
    pub username: String,
    pub email: String,
    pub total_loans: i64,
    pub active_loans: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ItemAnalytics {
    pub total: i64,
    /// Items with at least one available copy
    pub available: i64,
    /// Copies currently checked out across the catalog
    pub borrowed_copies: i64,
    #[schema(value_type = Object)]
    pub by_category: IndexMap<String, i64>,
    pub most_borrowed: Vec<PopularItem>,
    pub least_borrowed: Vec<PopularItem>,
    pub average_items_per_borrower: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PopularItem {
    pub title: String,
    pub author: String,
    pub category: String,
    /// Number of loan cycles recorded against the item
    pub loan_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoanAnalytics {
    pub total: i64,
    pub active: i64,
    /// Computed predicate (active and past due), not the stored label
    pub overdue: i64,
    pub today: i64,
    pub this_week: i64,
    pub this_month: i64,
    /// Mean whole days between borrow and return over returned loans
    pub average_return_days: f64,
    #[schema(value_type = Object)]
    pub by_kind: IndexMap<String, i64>,
    /// Trailing window, oldest day first
    pub daily_activity: Vec<DailyActivity>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub borrow_count: i64,
    pub return_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InventoryAnalytics {
    pub total_copies: i64,
    pub available_copies: i64,
    pub borrowed_copies: i64,
    /// Checked-out fraction of all copies, percent
    pub utilization_rate: f64,
    pub low_stock: Vec<String>,
    pub high_demand: Vec<String>,
    #[schema(value_type = Object)]
    pub category_utilization: IndexMap<String, f64>,
}

/// Static component snapshot; no real monitoring behind it
#[derive(Debug, Serialize, ToSchema)]
pub struct SystemHealth {
    pub status: String,
    #[schema(value_type = Object)]
    pub components: IndexMap<String, String>,
}

#[derive(Clone)]
pub struct AnalyticsService {
    repository: Repository,
}

impl AnalyticsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Generate the dashboard from a fresh snapshot
    pub async fn generate_dashboard(&self) -> AppResult<Dashboard> {
        let snapshot = self.snapshot().await?;
        let dashboard = compute_dashboard(&snapshot, Local::now());
        tracing::debug!(
            items = snapshot.items.len(),
            borrowers = snapshot.borrowers.len(),
            loans = snapshot.loans.len(),
            "analytics dashboard generated"
        );
        Ok(dashboard)
    }

    /// Read items, borrowers and loans at one logical instant
    async fn snapshot(&self) -> AppResult<Snapshot> {
        let mut tx = self.repository.pool.begin().await?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await?;

        let items = sqlx::query_as::<_, Item>("SELECT * FROM items ORDER BY id")
            .fetch_all(&mut *tx)
            .await?;
        let borrowers = sqlx::query_as::<_, Borrower>("SELECT * FROM borrowers ORDER BY id")
            .fetch_all(&mut *tx)
            .await?;
        let loans = sqlx::query_as::<_, Loan>("SELECT * FROM loans ORDER BY id")
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Snapshot {
            items,
            borrowers,
            loans,
        })
    }
}

/// Month-over-month growth in percent. A month starting from zero counts as
/// 100% growth when anything arrived, 0% when nothing did.
pub fn calculate_growth_rate(previous: i64, current: i64) -> f64 {
    if previous == 0 {
        return if current > 0 { 100.0 } else { 0.0 };
    }
    (current - previous) as f64 / previous as f64 * 100.0
}

/// Compute every dashboard section from one snapshot
pub fn compute_dashboard<Tz: TimeZone>(snapshot: &Snapshot, now: DateTime<Tz>) -> Dashboard {
    let tz = now.timezone();
    let now_utc = now.with_timezone(&Utc);
    let today = now.date_naive();

    Dashboard {
        generated_at: now_utc,
        borrowers: borrower_analytics(snapshot, &tz, today),
        items: item_analytics(snapshot),
        loans: loan_analytics(snapshot, &tz, today, now_utc),
        inventory: inventory_analytics(snapshot),
        system_health: system_health(),
    }
}

/// Project a UTC instant onto its calendar date in the dashboard timezone
fn local_date<Tz: TimeZone>(t: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    t.with_timezone(tz).date_naive()
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn borrower_analytics<Tz: TimeZone>(
    snapshot: &Snapshot,
    tz: &Tz,
    today: NaiveDate,
) -> BorrowerAnalytics {
    let this_month_start = month_start(today);
    let last_month_start = this_month_start
        .pred_opt()
        .map(month_start)
        .unwrap_or(this_month_start);

    let active: HashSet<i64> = snapshot
        .loans
        .iter()
        .filter(|l| l.is_open())
        .map(|l| l.borrower_id)
        .collect();

    let mut new_this_month = 0i64;
    let mut new_last_month = 0i64;
    for borrower in &snapshot.borrowers {
        let created = local_date(borrower.created_at, tz);
        if created >= this_month_start {
            new_this_month += 1;
        } else if created >= last_month_start {
            new_last_month += 1;
        }
    }

    let mut by_role: IndexMap<String, i64> = BorrowerRole::ALL
        .iter()
        .map(|role| (role.as_str().to_string(), 0))
        .collect();
    for borrower in &snapshot.borrowers {
        *by_role
            .entry(borrower.role.as_str().to_string())
            .or_insert(0) += 1;
    }

    // Loan counts per borrower, ranked by total history
    let mut counts: HashMap<i64, (i64, i64)> = HashMap::new();
    for loan in &snapshot.loans {
        let entry = counts.entry(loan.borrower_id).or_insert((0, 0));
        entry.0 += 1;
        if loan.is_open() {
            entry.1 += 1;
        }
    }

    let mut ranked: Vec<(&Borrower, i64, i64)> = snapshot
        .borrowers
        .iter()
        .map(|b| {
            let (total, open) = counts.get(&b.id).copied().unwrap_or((0, 0));
            (b, total, open)
        })
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.id.cmp(&b.0.id)));

    let top_borrowers = ranked
        .into_iter()
        .take(TOP_BORROWERS)
        .map(|(b, total, open)| BorrowerActivity {
            username: b.username.clone(),
            email: b.email.clone(),
            total_loans: total,
            active_loans: open,
        })
        .collect();

    BorrowerAnalytics {
        total: snapshot.borrowers.len() as i64,
        active: active.len() as i64,
        new_this_month,
        growth_rate: calculate_growth_rate(new_last_month, new_this_month),
        by_role,
        top_borrowers,
    }
}

fn item_analytics(snapshot: &Snapshot) -> ItemAnalytics {
    let total = snapshot.items.len() as i64;
    let available = snapshot
        .items
        .iter()
        .filter(|i| i.available_copies > 0)
        .count() as i64;

    let total_copies: i64 = snapshot.items.iter().map(|i| i64::from(i.total_copies)).sum();
    let available_copies: i64 = snapshot
        .items
        .iter()
        .map(|i| i64::from(i.available_copies))
        .sum();

    let mut by_category: IndexMap<String, i64> = IndexMap::new();
    for item in &snapshot.items {
        *by_category.entry(item.category.clone()).or_insert(0) += 1;
    }
    by_category.sort_keys();

    // Popularity counts every ledger row referencing the item; with the
    // single-row ledger that is exactly one row per loan cycle.
    let mut loan_counts: HashMap<i64, i64> = HashMap::new();
    for loan in &snapshot.loans {
        *loan_counts.entry(loan.item_id).or_insert(0) += 1;
    }

    let ranked: Vec<(&Item, i64)> = snapshot
        .items
        .iter()
        .map(|i| (i, loan_counts.get(&i.id).copied().unwrap_or(0)))
        .collect();

    let mut most = ranked.clone();
    most.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.id.cmp(&b.0.id)));
    let most_borrowed = most
        .into_iter()
        .take(MOST_BORROWED)
        .map(|(i, count)| popular_item(i, count))
        .collect();

    let mut least = ranked;
    least.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.id.cmp(&b.0.id)));
    let least_borrowed = least
        .into_iter()
        .take(LEAST_BORROWED)
        .map(|(i, count)| popular_item(i, count))
        .collect();

    let borrowers = snapshot.borrowers.len() as i64;
    let average_items_per_borrower = if borrowers > 0 {
        total as f64 / borrowers as f64
    } else {
        0.0
    };

    ItemAnalytics {
        total,
        available,
        borrowed_copies: total_copies - available_copies,
        by_category,
        most_borrowed,
        least_borrowed,
        average_items_per_borrower,
    }
}

fn popular_item(item: &Item, loan_count: i64) -> PopularItem {
    PopularItem {
        title: item.title.clone(),
        author: item.author.clone(),
        category: item.category.clone(),
        loan_count,
    }
}

fn loan_analytics<Tz: TimeZone>(
    snapshot: &Snapshot,
    tz: &Tz,
    today: NaiveDate,
    now_utc: DateTime<Utc>,
) -> LoanAnalytics {
    let week_start = today.week(Weekday::Mon).first_day();
    let this_month_start = month_start(today);

    let mut active = 0i64;
    let mut overdue = 0i64;
    let mut today_count = 0i64;
    let mut this_week = 0i64;
    let mut this_month = 0i64;

    for loan in &snapshot.loans {
        if loan.status == crate::models::loan::LoanStatus::Active {
            active += 1;
        }
        if loan.is_overdue(now_utc) {
            overdue += 1;
        }
        let created = local_date(loan.created_at, tz);
        if created == today {
            today_count += 1;
        }
        if created >= week_start {
            this_week += 1;
        }
        if created >= this_month_start {
            this_month += 1;
        }
    }

    let mut returned_days = 0i64;
    let mut returned_count = 0i64;
    for loan in &snapshot.loans {
        if loan.status.is_returned() {
            if let Some(returned_at) = loan.returned_at {
                returned_days += (returned_at - loan.borrowed_at).num_days();
                returned_count += 1;
            }
        }
    }
    let average_return_days = if returned_count > 0 {
        returned_days as f64 / returned_count as f64
    } else {
        0.0
    };

    let mut by_kind: IndexMap<String, i64> = LoanKind::ALL
        .iter()
        .map(|kind| (kind.as_str().to_string(), 0))
        .collect();
    for loan in &snapshot.loans {
        *by_kind.entry(loan.kind.as_str().to_string()).or_insert(0) += 1;
    }

    // Borrows bucket on the borrow instant, returns on the return instant,
    // so one cycle shows up in both legs of the series.
    let mut daily_activity = Vec::with_capacity(ACTIVITY_WINDOW_DAYS as usize);
    for offset in (0..ACTIVITY_WINDOW_DAYS).rev() {
        let date = today - Duration::days(offset);
        let borrow_count = snapshot
            .loans
            .iter()
            .filter(|l| l.kind == LoanKind::Borrow && local_date(l.borrowed_at, tz) == date)
            .count() as i64;
        let return_count = snapshot
            .loans
            .iter()
            .filter(|l| {
                l.returned_at
                    .map(|t| local_date(t, tz) == date)
                    .unwrap_or(false)
            })
            .count() as i64;
        daily_activity.push(DailyActivity {
            date,
            borrow_count,
            return_count,
        });
    }

    LoanAnalytics {
        total: snapshot.loans.len() as i64,
        active,
        overdue,
        today: today_count,
        this_week,
        this_month,
        average_return_days,
        by_kind,
        daily_activity,
    }
}

fn inventory_analytics(snapshot: &Snapshot) -> InventoryAnalytics {
    let total_copies: i64 = snapshot.items.iter().map(|i| i64::from(i.total_copies)).sum();
    let available_copies: i64 = snapshot
        .items
        .iter()
        .map(|i| i64::from(i.available_copies))
        .sum();
    let borrowed_copies = total_copies - available_copies;

    let utilization_rate = if total_copies > 0 {
        borrowed_copies as f64 / total_copies as f64 * 100.0
    } else {
        0.0
    };

    let low_stock = snapshot
        .items
        .iter()
        .filter(|i| i.available_copies < LOW_STOCK_THRESHOLD)
        .map(|i| i.title.clone())
        .collect();

    let high_demand = snapshot
        .items
        .iter()
        .filter(|i| i.total_copies > 0 && i.utilization() > HIGH_DEMAND_UTILIZATION)
        .map(|i| i.title.clone())
        .collect();

    let mut category_copies: IndexMap<String, (i64, i64)> = IndexMap::new();
    for item in &snapshot.items {
        let entry = category_copies
            .entry(item.category.clone())
            .or_insert((0, 0));
        entry.0 += i64::from(item.total_copies);
        entry.1 += i64::from(item.available_copies);
    }
    category_copies.sort_keys();

    let category_utilization = category_copies
        .into_iter()
        .map(|(category, (total, available))| {
            let rate = if total > 0 {
                (total - available) as f64 / total as f64 * 100.0
            } else {
                0.0
            };
            (category, rate)
        })
        .collect();

    InventoryAnalytics {
        total_copies,
        available_copies,
        borrowed_copies,
        utilization_rate,
        low_stock,
        high_demand,
        category_utilization,
    }
}

fn system_health() -> SystemHealth {
    let components: IndexMap<String, String> = [
        ("catalog", "healthy"),
        ("ledger", "healthy"),
        ("lending", "healthy"),
        ("analytics", "healthy"),
        ("database", "healthy"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    SystemHealth {
        status: "healthy".to_string(),
        components,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::item::ItemStatus;
    use crate::models::loan::LoanStatus;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    // Wednesday 2025-06-18; ISO week starts Monday 2025-06-16
    fn now() -> DateTime<Utc> {
        at(2025, 6, 18, 12)
    }

    fn item(id: i64, category: &str, total: i32, available: i32) -> Item {
        Item {
            id,
            isbn: format!("978-0-00-0000{:02}-1", id),
            title: format!("Item {}", id),
            author: format!("Author {}", id),
            category: category.to_string(),
            publisher: None,
            publication_year: None,
            price: None,
            language: None,
            pages: None,
            description: None,
            total_copies: total,
            available_copies: available,
            status: ItemStatus::Available,
            created_at: at(2025, 1, 1, 0),
            updated_at: at(2025, 1, 1, 0),
        }
    }

    fn borrower(id: i64, role: BorrowerRole, created_at: DateTime<Utc>) -> Borrower {
        Borrower {
            id,
            username: format!("user{}", id),
            email: format!("user{}@example.org", id),
            full_name: None,
            role,
            created_at,
            updated_at: created_at,
        }
    }

    fn loan(
        id: i64,
        borrower_id: i64,
        item_id: i64,
        status: LoanStatus,
        borrowed_at: DateTime<Utc>,
    ) -> Loan {
        Loan {
            id,
            borrower_id,
            item_id,
            kind: LoanKind::Borrow,
            status,
            borrowed_at,
            due_date: borrowed_at + Duration::days(14),
            returned_at: None,
            notes: None,
            created_at: borrowed_at,
            updated_at: borrowed_at,
        }
    }

    fn returned_loan(
        id: i64,
        borrower_id: i64,
        item_id: i64,
        borrowed_at: DateTime<Utc>,
        returned_at: DateTime<Utc>,
    ) -> Loan {
        let mut l = loan(id, borrower_id, item_id, LoanStatus::Returned, borrowed_at);
        l.returned_at = Some(returned_at);
        l
    }

    #[test]
    fn growth_rate_edge_cases() {
        assert_eq!(calculate_growth_rate(0, 0), 0.0);
        assert_eq!(calculate_growth_rate(0, 5), 100.0);
        assert_eq!(calculate_growth_rate(10, 15), 50.0);
        assert_eq!(calculate_growth_rate(10, 5), -50.0);
    }

    #[test]
    fn empty_snapshot_yields_zeroed_dashboard() {
        let dashboard = compute_dashboard(&Snapshot::default(), now());

        assert_eq!(dashboard.borrowers.total, 0);
        assert_eq!(dashboard.borrowers.growth_rate, 0.0);
        assert!(dashboard.borrowers.top_borrowers.is_empty());
        assert_eq!(dashboard.items.total, 0);
        assert_eq!(dashboard.items.average_items_per_borrower, 0.0);
        assert_eq!(dashboard.loans.total, 0);
        assert_eq!(dashboard.loans.average_return_days, 0.0);
        assert_eq!(dashboard.loans.daily_activity.len(), 7);
        assert_eq!(dashboard.inventory.utilization_rate, 0.0);
        assert_eq!(dashboard.system_health.status, "healthy");
    }

    #[test]
    fn active_borrowers_are_distinct() {
        let snapshot = Snapshot {
            items: vec![item(1, "Fiction", 5, 2)],
            borrowers: vec![
                borrower(1, BorrowerRole::Member, at(2025, 1, 5, 0)),
                borrower(2, BorrowerRole::Member, at(2025, 1, 5, 0)),
                borrower(3, BorrowerRole::Member, at(2025, 1, 5, 0)),
            ],
            loans: vec![
                loan(1, 1, 1, LoanStatus::Active, at(2025, 6, 10, 0)),
                loan(2, 1, 2, LoanStatus::Overdue, at(2025, 6, 1, 0)),
                loan(3, 2, 1, LoanStatus::Returned, at(2025, 5, 1, 0)),
            ],
        };

        let section = borrower_analytics(&snapshot, &Utc, now().date_naive());
        // borrower 1 holds two open loans, borrower 2 only history
        assert_eq!(section.active, 1);
        assert_eq!(section.total, 3);
    }

    #[test]
    fn borrower_growth_and_month_bucketing() {
        let snapshot = Snapshot {
            items: vec![],
            borrowers: vec![
                borrower(1, BorrowerRole::Member, at(2025, 6, 2, 0)),
                borrower(2, BorrowerRole::Member, at(2025, 6, 17, 0)),
                borrower(3, BorrowerRole::Member, at(2025, 5, 20, 0)),
                borrower(4, BorrowerRole::Librarian, at(2024, 12, 1, 0)),
            ],
            loans: vec![],
        };

        let section = borrower_analytics(&snapshot, &Utc, now().date_naive());
        assert_eq!(section.new_this_month, 2);
        // one registration in May, two in June: +100%
        assert_eq!(section.growth_rate, 100.0);
        assert_eq!(section.by_role.get("member"), Some(&3));
        assert_eq!(section.by_role.get("librarian"), Some(&1));
        assert_eq!(section.by_role.get("admin"), Some(&0));
    }

    #[test]
    fn top_borrowers_rank_by_history_ties_by_id() {
        let borrowed = at(2025, 5, 1, 0);
        let snapshot = Snapshot {
            items: vec![],
            borrowers: (1..=7)
                .map(|id| borrower(id, BorrowerRole::Member, at(2025, 1, 1, 0)))
                .collect(),
            loans: vec![
                returned_loan(1, 3, 1, borrowed, at(2025, 5, 3, 0)),
                returned_loan(2, 3, 2, borrowed, at(2025, 5, 3, 0)),
                returned_loan(3, 5, 1, borrowed, at(2025, 5, 3, 0)),
                returned_loan(4, 5, 2, borrowed, at(2025, 5, 3, 0)),
                loan(5, 2, 3, LoanStatus::Active, borrowed),
            ],
        };

        let section = borrower_analytics(&snapshot, &Utc, now().date_naive());
        assert_eq!(section.top_borrowers.len(), 5);
        // 3 and 5 tie on two loans each; lower id first
        assert_eq!(section.top_borrowers[0].username, "user3");
        assert_eq!(section.top_borrowers[1].username, "user5");
        assert_eq!(section.top_borrowers[2].username, "user2");
        assert_eq!(section.top_borrowers[2].active_loans, 1);
        // remaining slots filled by zero-loan borrowers in id order
        assert_eq!(section.top_borrowers[3].username, "user1");
        assert_eq!(section.top_borrowers[3].total_loans, 0);
    }

    #[test]
    fn item_counts_and_popularity() {
        let borrowed = at(2025, 5, 1, 0);
        let snapshot = Snapshot {
            items: vec![
                item(1, "Fiction", 3, 0),
                item(2, "Fiction", 2, 2),
                item(3, "Science", 4, 1),
            ],
            borrowers: vec![borrower(1, BorrowerRole::Member, at(2025, 1, 1, 0))],
            loans: vec![
                returned_loan(1, 1, 3, borrowed, at(2025, 5, 2, 0)),
                returned_loan(2, 1, 3, at(2025, 5, 3, 0), at(2025, 5, 4, 0)),
                loan(3, 1, 1, LoanStatus::Active, borrowed),
            ],
        };

        let section = item_analytics(&snapshot);
        assert_eq!(section.total, 3);
        assert_eq!(section.available, 2);
        assert_eq!(section.borrowed_copies, (3 + 2 + 4) - (0 + 2 + 1));
        assert_eq!(section.by_category.get("Fiction"), Some(&2));
        assert_eq!(section.by_category.get("Science"), Some(&1));

        assert_eq!(section.most_borrowed[0].title, "Item 3");
        assert_eq!(section.most_borrowed[0].loan_count, 2);
        assert_eq!(section.most_borrowed[1].title, "Item 1");
        // least borrowed: the never-borrowed item 2 leads
        assert_eq!(section.least_borrowed[0].title, "Item 2");
        assert_eq!(section.least_borrowed[0].loan_count, 0);

        assert_eq!(section.average_items_per_borrower, 3.0);
    }

    #[test]
    fn overdue_uses_computed_predicate_not_stored_label() {
        let overdue_borrow = at(2025, 5, 1, 0); // due 2025-05-15, long past
        let snapshot = Snapshot {
            items: vec![],
            borrowers: vec![],
            loans: vec![
                // never swept: still counted
                loan(1, 1, 1, LoanStatus::Active, overdue_borrow),
                // swept to the informational label: not in the computed count
                loan(2, 2, 2, LoanStatus::Overdue, overdue_borrow),
                // active but not yet due
                loan(3, 3, 3, LoanStatus::Active, at(2025, 6, 10, 0)),
                // returned late: terminal, never overdue
                returned_loan(4, 4, 4, overdue_borrow, at(2025, 6, 1, 0)),
            ],
        };

        let section = loan_analytics(&snapshot, &Utc, now().date_naive(), now());
        assert_eq!(section.overdue, 1);
        assert_eq!(section.active, 2);
        assert_eq!(section.total, 4);
    }

    #[test]
    fn loan_time_buckets() {
        let snapshot = Snapshot {
            items: vec![],
            borrowers: vec![],
            loans: vec![
                loan(1, 1, 1, LoanStatus::Active, at(2025, 6, 18, 9)), // today
                loan(2, 2, 2, LoanStatus::Active, at(2025, 6, 16, 9)), // this ISO week
                loan(3, 3, 3, LoanStatus::Active, at(2025, 6, 2, 9)),  // this month
                loan(4, 4, 4, LoanStatus::Returned, at(2025, 5, 28, 9)), // last month
            ],
        };

        let section = loan_analytics(&snapshot, &Utc, now().date_naive(), now());
        assert_eq!(section.today, 1);
        assert_eq!(section.this_week, 2);
        assert_eq!(section.this_month, 3);
    }

    #[test]
    fn average_return_days_over_returned_loans_only() {
        let snapshot = Snapshot {
            items: vec![],
            borrowers: vec![],
            loans: vec![
                returned_loan(1, 1, 1, at(2025, 5, 1, 0), at(2025, 5, 5, 0)), // 4 days
                returned_loan(2, 2, 2, at(2025, 5, 1, 0), at(2025, 5, 11, 0)), // 10 days
                loan(3, 3, 3, LoanStatus::Active, at(2025, 6, 10, 0)),
                loan(4, 4, 4, LoanStatus::Cancelled, at(2025, 6, 1, 0)),
            ],
        };

        let section = loan_analytics(&snapshot, &Utc, now().date_naive(), now());
        assert_eq!(section.average_return_days, 7.0);
    }

    #[test]
    fn daily_activity_window_is_oldest_first() {
        let snapshot = Snapshot {
            items: vec![],
            borrowers: vec![],
            loans: vec![
                loan(1, 1, 1, LoanStatus::Active, at(2025, 6, 18, 8)),
                loan(2, 2, 2, LoanStatus::Active, at(2025, 6, 15, 8)),
                returned_loan(3, 3, 3, at(2025, 6, 12, 8), at(2025, 6, 17, 8)),
                // outside the 7-day window entirely
                loan(4, 4, 4, LoanStatus::Active, at(2025, 6, 1, 8)),
            ],
        };

        let section = loan_analytics(&snapshot, &Utc, now().date_naive(), now());
        assert_eq!(section.daily_activity.len(), 7);
        assert_eq!(
            section.daily_activity[0].date,
            NaiveDate::from_ymd_opt(2025, 6, 12).unwrap()
        );
        assert_eq!(
            section.daily_activity[6].date,
            NaiveDate::from_ymd_opt(2025, 6, 18).unwrap()
        );
        // borrow on the 12th, return of the same loan on the 17th
        assert_eq!(section.daily_activity[0].borrow_count, 1);
        assert_eq!(section.daily_activity[5].return_count, 1);
        assert_eq!(section.daily_activity[6].borrow_count, 1);
        assert_eq!(section.daily_activity[3].borrow_count, 1);
        let total_borrows: i64 = section.daily_activity.iter().map(|d| d.borrow_count).sum();
        assert_eq!(total_borrows, 3);
    }

    #[test]
    fn inventory_thresholds() {
        let mut nearly_out = item(1, "Fiction", 10, 1); // 90% utilized, low stock
        nearly_out.title = "Nearly Out".to_string();
        let mut balanced = item(2, "Fiction", 10, 6); // 40% utilized
        balanced.title = "Balanced".to_string();
        let mut at_limit = item(3, "Science", 5, 1); // exactly 80%: not high demand
        at_limit.title = "At Limit".to_string();

        let snapshot = Snapshot {
            items: vec![nearly_out, balanced, at_limit],
            borrowers: vec![],
            loans: vec![],
        };

        let section = inventory_analytics(&snapshot);
        assert_eq!(section.total_copies, 25);
        assert_eq!(section.available_copies, 8);
        assert_eq!(section.borrowed_copies, 17);
        assert_eq!(section.utilization_rate, 17.0 / 25.0 * 100.0);
        assert_eq!(
            section.low_stock,
            vec!["Nearly Out".to_string(), "At Limit".to_string()]
        );
        // strictly greater than 80%
        assert_eq!(section.high_demand, vec!["Nearly Out".to_string()]);
        assert_eq!(
            section.category_utilization.get("Science"),
            Some(&(4.0 / 5.0 * 100.0))
        );
    }

    #[test]
    fn dashboard_sections_share_one_snapshot_instant() {
        let snapshot = Snapshot {
            items: vec![item(1, "Fiction", 2, 1)],
            borrowers: vec![borrower(1, BorrowerRole::Member, at(2025, 6, 1, 0))],
            loans: vec![loan(1, 1, 1, LoanStatus::Active, at(2025, 6, 10, 0))],
        };

        let dashboard = compute_dashboard(&snapshot, now());
        assert_eq!(dashboard.generated_at, now());
        // the one open loan is visible identically to every section
        assert_eq!(dashboard.borrowers.active, 1);
        assert_eq!(dashboard.loans.active, 1);
        assert_eq!(dashboard.inventory.borrowed_copies, 1);
        assert_eq!(dashboard.items.borrowed_copies, 1);
    }
}
