use std::sync::Arc;

use chrono::Duration;
use uuid::Uuid;

use services::{
    BookService, DashboardService, GoalService, ProfileService, SessionService,
};
use storage::repository::InMemoryRepository;
use tracker_core::model::{
    BookDraft, Genre, GoalDraft, GoalType, ReadingStatus, SessionDraft, UserId,
};
use tracker_core::time::{fixed_clock, fixed_now, fixed_today};

struct App {
    books: BookService,
    sessions: SessionService,
    goals: GoalService,
    dashboard: DashboardService,
    profiles: ProfileService,
}

fn build_app() -> App {
    let repo = InMemoryRepository::new();
    let clock = fixed_clock();
    let books_repo = Arc::new(repo.clone());
    let sessions_repo = Arc::new(repo.clone());
    let goals_repo = Arc::new(repo.clone());
    let profiles_repo = Arc::new(repo);

    App {
        books: BookService::new(clock, books_repo.clone(), sessions_repo.clone()),
        sessions: SessionService::new(clock, sessions_repo.clone(), books_repo.clone()),
        goals: GoalService::new(
            clock,
            goals_repo.clone(),
            sessions_repo.clone(),
            books_repo.clone(),
        ),
        dashboard: DashboardService::new(clock, books_repo, sessions_repo, goals_repo),
        profiles: ProfileService::new(clock, profiles_repo),
    }
}

fn reader() -> UserId {
    UserId::new(Uuid::from_u128(42))
}

#[tokio::test]
async fn full_reading_flow_from_shelf_to_dashboard() {
    let app = build_app();
    let user = reader();

    app.profiles
        .update_profile(user, true, "one chapter a night", None)
        .await
        .unwrap();

    let book = app
        .books
        .add_book(BookDraft::new(
            user,
            "Dune",
            "Frank Herbert",
            200,
            Genre::SciFiFantasy,
        ))
        .await
        .unwrap();
    assert_eq!(book.status(), ReadingStatus::ToBeRead);

    // A monthly goal covering the last ten days and the next twenty.
    let today = fixed_today();
    let mut goal_draft = GoalDraft::new(
        user,
        GoalType::Monthly,
        300,
        today - Duration::days(10),
        today + Duration::days(20),
    );
    goal_draft.target_books = 1;
    let goal = app.goals.create_goal(goal_draft).await.unwrap();

    // Two sittings on consecutive days.
    let first_start = fixed_now() - Duration::days(1);
    let (_, progress) = app
        .sessions
        .log_session(SessionDraft::new(
            user,
            book.id(),
            80,
            first_start,
            first_start + Duration::hours(1),
        ))
        .await
        .unwrap();
    assert_eq!(progress.percent, 40.0);

    let second_start = fixed_now();
    let (_, progress) = app
        .sessions
        .log_session(SessionDraft::new(
            user,
            book.id(),
            120,
            second_start,
            second_start + Duration::hours(2),
        ))
        .await
        .unwrap();
    assert_eq!(progress.percent, 100.0);
    assert!(progress.newly_completed);

    let finished = app.books.get_book(user, book.id()).await.unwrap();
    assert_eq!(finished.status(), ReadingStatus::Completed);

    // Goal progress sees both sittings and the completed book.
    let goal_progress = app.goals.progress(&goal).await.unwrap();
    assert_eq!(goal_progress.pages_read, 200);
    assert_eq!(goal_progress.pages_remaining, 100);
    assert_eq!(goal_progress.books_completed, 1);
    assert_eq!(goal_progress.books_remaining, 0);
    assert_eq!(goal_progress.pages_needed_per_day, 5); // ceil(100 / 20)

    // Dashboard pulls it all together.
    let summary = app.dashboard.summary(user).await;
    assert_eq!(summary.total_books, 1);
    assert_eq!(summary.books_completed, 1);
    assert!(summary.currently_reading.is_empty());
    assert_eq!(summary.pages_last_30_days, 200);
    let active = summary.active_goal.expect("active goal");
    assert_eq!(active.goal.id(), goal.id());
    assert_eq!(active.progress.pages_read, 200);
    assert!(summary.warnings.is_empty());

    // Two consecutive active days, the latest being today.
    let streaks = app.dashboard.streaks(user).await;
    assert_eq!(streaks.current, 2);
    assert_eq!(streaks.longest, 2);
}

#[tokio::test]
async fn abandoning_mid_way_freezes_the_status_but_not_the_numbers() {
    let app = build_app();
    let user = reader();

    let book = app
        .books
        .add_book(BookDraft::new(
            user,
            "The Power Broker",
            "Robert Caro",
            1000,
            Genre::BiographyMemoir,
        ))
        .await
        .unwrap();

    let start = fixed_now() - Duration::days(1);
    app.sessions
        .log_session(SessionDraft::new(
            user,
            book.id(),
            600,
            start,
            start + Duration::hours(3),
        ))
        .await
        .unwrap();

    let (abandoned, progress) = app.books.mark_abandoned(user, book.id()).await.unwrap();
    assert_eq!(abandoned.status(), ReadingStatus::Abandoned);
    assert_eq!(progress.percent, 60.0);

    // Logging more pages keeps the abandoned status, even past 100%.
    let start = fixed_now();
    let (_, progress) = app
        .sessions
        .log_session(SessionDraft::new(
            user,
            book.id(),
            500,
            start,
            start + Duration::hours(3),
        ))
        .await
        .unwrap();
    assert_eq!(progress.percent, 100.0);
    assert!(!progress.newly_completed);

    let fetched = app.books.get_book(user, book.id()).await.unwrap();
    assert_eq!(fetched.status(), ReadingStatus::Abandoned);

    // And the dashboard counts no completion.
    let summary = app.dashboard.summary(user).await;
    assert_eq!(summary.books_completed, 0);
}

#[tokio::test]
async fn deleting_a_book_clears_its_history_everywhere() {
    let app = build_app();
    let user = reader();

    let keeper = app
        .books
        .add_book(BookDraft::new(user, "Keeper", "Author", 100, Genre::Poetry))
        .await
        .unwrap();
    let goner = app
        .books
        .add_book(BookDraft::new(user, "Goner", "Author", 100, Genre::Drama))
        .await
        .unwrap();

    let start = fixed_now();
    app.sessions
        .log_session(SessionDraft::new(
            user,
            keeper.id(),
            10,
            start,
            start + Duration::hours(1),
        ))
        .await
        .unwrap();
    let (doomed_session, _) = app
        .sessions
        .log_session(SessionDraft::new(
            user,
            goner.id(),
            20,
            start,
            start + Duration::hours(1),
        ))
        .await
        .unwrap();

    app.books.delete_book(user, goner.id()).await.unwrap();

    assert!(
        app.sessions
            .get_session(user, doomed_session.id())
            .await
            .is_err()
    );

    let summary = app.dashboard.summary(user).await;
    assert_eq!(summary.total_books, 1);
    assert_eq!(summary.pages_last_30_days, 10);
}
