//! The chart catalog: which services are tracked, which sections their
//! pages carry, and which destination list each section feeds.

use chartsync_core::feed::FLIXPATROL_BASE;
use chartsync_core::sync::{ChartTask, ListDiscipline, ListSpec};
use chrono::NaiveDate;

/// Charts are tracked for one country's pages.
const COUNTRY: &str = "portugal";

pub const SECTION_MOVIES: &str = "TOP 10 Movies";
pub const SECTION_SHOWS: &str = "TOP 10 TV Shows";
pub const SECTION_KIDS_MOVIES: &str = "TOP 10 Kids Movies";
pub const SECTION_KIDS_SHOWS: &str = "TOP 10 Kids TV Shows";
pub const SECTION_OVERALL: &str = "TOP 10 Overall";

fn chart_url(service: &str) -> String {
    format!("{FLIXPATROL_BASE}/top10/{service}/{COUNTRY}/")
}

fn dated_chart_url(service: &str, date: NaiveDate) -> String {
    format!("{FLIXPATROL_BASE}/top10/{service}/{COUNTRY}/{date}/")
}

fn list(slug: &str, name: &str, subject: &str, discipline: ListDiscipline) -> ListSpec {
    ListSpec {
        slug: slug.to_string(),
        name: name.to_string(),
        description: format!("List that contains {subject} right now, updated daily"),
        discipline,
    }
}

fn task(key: &str, url: &str, section: &str, list: ListSpec) -> ChartTask {
    ChartTask {
        key: key.to_string(),
        url: url.to_string(),
        section: section.to_string(),
        list,
    }
}

/// Build the full chart plan.
///
/// The kids sections only exist on the dated "yesterday" page, so the plan
/// needs yesterday's date; they are included only when the kids toggle is
/// on.
pub fn chart_plan(kids: bool, yesterday: NaiveDate) -> Vec<ChartTask> {
    let netflix = chart_url("netflix");
    let netflix_kids = dated_chart_url("netflix", yesterday);
    let hbo = chart_url("hbo-max");
    let disney = chart_url("disney");
    let apple = chart_url("apple-tv");
    let prime = chart_url("amazon-prime");

    let mut tasks = vec![
        task(
            "netflix_movies",
            &netflix,
            SECTION_MOVIES,
            list(
                "top-portugal-netflix-movies",
                "Top Portugal Netflix Movies",
                "the top 10 movies on Netflix Portugal",
                ListDiscipline::Movies,
            ),
        ),
        task(
            "netflix_shows",
            &netflix,
            SECTION_SHOWS,
            list(
                "top-portugal-netflix-shows",
                "Top Portugal Netflix Shows",
                "the top 10 TV shows on Netflix Portugal",
                ListDiscipline::Shows,
            ),
        ),
    ];

    if kids {
        tasks.push(task(
            "netflix_kids_movies",
            &netflix_kids,
            SECTION_KIDS_MOVIES,
            list(
                "top-portugal-netflix-kids-movies",
                "Top Portugal Netflix Kids Movies",
                "the top 10 kids movies on Netflix Portugal",
                ListDiscipline::Movies,
            ),
        ));
        tasks.push(task(
            "netflix_kids_shows",
            &netflix_kids,
            SECTION_KIDS_SHOWS,
            list(
                "top-portugal-netflix-kids-shows",
                "Top Portugal Netflix Kids Shows",
                "the top 10 kids TV shows on Netflix Portugal",
                ListDiscipline::Shows,
            ),
        ));
    }

    tasks.extend([
        task(
            "hbo_movies",
            &hbo,
            SECTION_MOVIES,
            list(
                "top-portugal-hbo-movies",
                "Top Portugal HBO Movies",
                "the top 10 movies on HBO Portugal",
                ListDiscipline::Movies,
            ),
        ),
        task(
            "hbo_shows",
            &hbo,
            SECTION_SHOWS,
            list(
                "top-portugal-hbo-shows",
                "Top Portugal HBO Shows",
                "the top 10 TV shows on HBO Portugal",
                ListDiscipline::Shows,
            ),
        ),
        // Disney+ stopped charting movies and shows separately, so its
        // single mixed section feeds one mixed-kind list.
        task(
            "disney_overall",
            &disney,
            SECTION_OVERALL,
            list(
                "top-portugal-disney",
                "Top Portugal Disney+",
                "the top movies and shows on Disney+ Portugal",
                ListDiscipline::Mixed,
            ),
        ),
        task(
            "apple_movies",
            &apple,
            SECTION_MOVIES,
            list(
                "top-portugal-apple-tv-movies",
                "Top Portugal Apple TV Movies",
                "the top 10 movies on Apple TV Portugal",
                ListDiscipline::Movies,
            ),
        ),
        task(
            "apple_shows",
            &apple,
            SECTION_SHOWS,
            list(
                "top-portugal-apple-tv-shows",
                "Top Portugal Apple TV Shows",
                "the top 10 TV shows on Apple TV Portugal",
                ListDiscipline::Shows,
            ),
        ),
        task(
            "prime_movies",
            &prime,
            SECTION_MOVIES,
            list(
                "top-portugal-amazon-prime-movies",
                "Top Portugal Amazon Prime Movies",
                "the top 10 movies on Amazon Prime Video Portugal",
                ListDiscipline::Movies,
            ),
        ),
        task(
            "prime_shows",
            &prime,
            SECTION_SHOWS,
            list(
                "top-portugal-amazon-prime-shows",
                "Top Portugal Amazon Prime Shows",
                "the top 10 TV shows on Amazon Prime Video Portugal",
                ListDiscipline::Shows,
            ),
        ),
    ]);

    tasks
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 6).unwrap()
    }

    #[test]
    fn test_plan_without_kids_has_nine_sections() {
        let plan = chart_plan(false, date());
        assert_eq!(plan.len(), 9);
        assert!(!plan.iter().any(|t| t.key.contains("kids")));
    }

    #[test]
    fn test_kids_sections_use_the_dated_page() {
        let plan = chart_plan(true, date());
        assert_eq!(plan.len(), 11);
        let kids: Vec<_> = plan.iter().filter(|t| t.key.contains("kids")).collect();
        assert_eq!(kids.len(), 2);
        for task in kids {
            assert!(task.url.ends_with("/2026-08-06/"), "url: {}", task.url);
        }
    }

    #[test]
    fn test_disney_is_the_only_mixed_list() {
        let plan = chart_plan(true, date());
        let mixed: Vec<_> = plan
            .iter()
            .filter(|t| t.list.discipline == ListDiscipline::Mixed)
            .collect();
        assert_eq!(mixed.len(), 1);
        assert_eq!(mixed[0].key, "disney_overall");
        assert_eq!(mixed[0].section, SECTION_OVERALL);
    }

    #[test]
    fn test_list_slugs_are_unique() {
        let plan = chart_plan(true, date());
        let slugs: HashSet<_> = plan.iter().map(|t| t.list.slug.as_str()).collect();
        assert_eq!(slugs.len(), plan.len());
    }

    #[test]
    fn test_sections_share_service_pages() {
        let plan = chart_plan(false, date());
        let urls: HashSet<_> = plan.iter().map(|t| t.url.as_str()).collect();
        // 9 sections across 5 service pages: the page cache makes the
        // shared fetches free.
        assert_eq!(urls.len(), 5);
    }
}
