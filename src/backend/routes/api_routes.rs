/**
 * Authenticated API Routes
 *
 * Every route here sits behind `auth_middleware`; handlers receive the
 * caller through the `AuthUser` extractor. Path parameters use axum's
 * `{name}` syntax.
 *
 * # Resources
 *
 * | Prefix | Module |
 * |---|---|
 * | `/api/auth/me`, `/api/users` | auth, users |
 * | `/api/friends` | social |
 * | `/api/groups` | groups |
 * | `/api/chats`, `/api/messages` | chat |
 * | `/api/posts`, `/api/comments` | blog |
 * | `/api/goals` | goals |
 * | `/api/challenges` | challenges |
 * | `/api/gamification`, `/api/badges/me`, `/api/streaks`, `/api/leaderboard`, `/api/points` | gamification |
 * | `/api/notifications` | notifications |
 * | `/api/activity` | activity |
 * | `/api/subscriptions` | billing |
 */

use axum::routing::{delete, get, patch, post};
use axum::Router;

use crate::backend::auth::get_me;
use crate::backend::server::state::AppState;
use crate::backend::{
    activity, blog, challenges, chat, gamification, goals, groups, notifications, social,
    subscription, users,
};

/// Configure every authenticated route
pub fn configure_api_routes(router: Router<AppState>) -> Router<AppState> {
    let router = router.route("/api/auth/me", get(get_me));
    let router = configure_user_routes(router);
    let router = configure_social_routes(router);
    let router = configure_group_routes(router);
    let router = configure_chat_routes(router);
    let router = configure_blog_routes(router);
    let router = configure_goal_routes(router);
    let router = configure_challenge_routes(router);
    let router = configure_gamification_routes(router);
    configure_account_routes(router)
}

fn configure_user_routes(router: Router<AppState>) -> Router<AppState> {
    use users::handlers::*;

    router
        .route(
            "/api/users/me",
            get(get_my_profile)
                .patch(update_my_profile)
                .delete(deactivate_account),
        )
        .route("/api/users/me/password", post(change_password))
        .route("/api/users/search", get(search_users))
        .route("/api/users/{id}", get(get_user_profile))
        .route("/api/users/{id}/goals", get(goals::handlers::list_user_goals))
}

fn configure_social_routes(router: Router<AppState>) -> Router<AppState> {
    use social::handlers::*;

    router
        .route("/api/friends", get(list_friends))
        .route("/api/friends/requests", get(incoming_requests).post(send_request))
        .route("/api/friends/requests/sent", get(sent_requests))
        .route("/api/friends/requests/{id}", delete(cancel_request))
        .route("/api/friends/respond", post(respond_request))
        .route("/api/friends/{user_id}", delete(unfriend))
        .route("/api/friends/{user_id}/block", post(block_user))
}

fn configure_group_routes(router: Router<AppState>) -> Router<AppState> {
    use groups::handlers::*;

    router
        .route("/api/groups", get(list_groups).post(create_group))
        .route("/api/groups/mine", get(my_groups))
        .route(
            "/api/groups/{id}",
            get(get_group).patch(update_group).delete(delete_group),
        )
        .route("/api/groups/{id}/join", post(join_group))
        .route("/api/groups/{id}/leave", post(leave_group))
        .route("/api/groups/{id}/members", get(list_members).post(add_member))
        .route("/api/groups/{id}/members/{user_id}", delete(remove_member))
}

fn configure_chat_routes(router: Router<AppState>) -> Router<AppState> {
    use chat::handlers::*;

    router
        .route("/api/chats", get(list_chats))
        .route("/api/chats/direct", post(open_direct_chat))
        .route("/api/chats/group", post(create_group_chat))
        .route("/api/chats/{id}", get(get_chat))
        .route("/api/chats/{id}/messages", get(list_messages).post(send_message))
        .route("/api/chats/{id}/read", post(mark_read))
        .route("/api/chats/{id}/typing", post(typing))
        .route("/api/messages/{id}", patch(edit_message).delete(delete_message))
        .route(
            "/api/messages/{id}/reactions",
            post(add_reaction).delete(remove_reaction),
        )
}

fn configure_blog_routes(router: Router<AppState>) -> Router<AppState> {
    use blog::handlers::*;

    router
        .route("/api/posts", get(list_posts).post(create_post))
        .route(
            "/api/posts/{id}",
            get(get_post).patch(update_post).delete(delete_post),
        )
        .route("/api/posts/{id}/publish", post(publish_post))
        .route("/api/posts/{id}/like", post(like_post).delete(unlike_post))
        .route("/api/posts/{id}/comments", get(list_comments).post(create_comment))
        .route("/api/comments/{id}", patch(update_comment).delete(delete_comment))
}

fn configure_goal_routes(router: Router<AppState>) -> Router<AppState> {
    use goals::handlers::*;

    router
        .route("/api/goals", get(list_goals).post(create_goal))
        .route(
            "/api/goals/{id}",
            get(get_goal).patch(update_goal).delete(delete_goal),
        )
        .route("/api/goals/{id}/complete", post(complete_goal))
        .route("/api/goals/{id}/milestones", post(create_milestone))
        .route(
            "/api/goals/{id}/milestones/{milestone_id}",
            patch(update_milestone).delete(delete_milestone),
        )
        .route("/api/goals/{id}/tasks", post(create_task))
        .route(
            "/api/goals/{id}/tasks/{task_id}",
            patch(update_task).delete(delete_task),
        )
}

fn configure_challenge_routes(router: Router<AppState>) -> Router<AppState> {
    use challenges::handlers::*;

    router
        .route("/api/challenges", get(list_challenges).post(create_challenge))
        .route(
            "/api/challenges/{id}",
            get(get_challenge)
                .patch(update_challenge)
                .delete(delete_challenge),
        )
        .route("/api/challenges/{id}/join", post(join_challenge))
        .route("/api/challenges/{id}/leave", post(leave_challenge))
        .route("/api/challenges/{id}/progress", post(report_progress))
        .route("/api/challenges/{id}/leaderboard", get(leaderboard))
}

fn configure_gamification_routes(router: Router<AppState>) -> Router<AppState> {
    use gamification::handlers::*;

    router
        .route("/api/gamification/me", get(my_summary))
        .route("/api/badges/me", get(my_badges))
        .route("/api/streaks/me", get(my_streaks))
        .route("/api/streaks/check-in", post(check_in))
        .route("/api/leaderboard", get(leaderboard))
        .route("/api/leaderboard/streaks", get(streak_leaderboard))
        .route("/api/points/history", get(points_history))
}

// Notifications, activity and subscription management
fn configure_account_routes(router: Router<AppState>) -> Router<AppState> {
    use notifications::handlers as notification_handlers;

    router
        .route("/api/notifications", get(notification_handlers::list_notifications))
        .route(
            "/api/notifications/unread-count",
            get(notification_handlers::unread_count),
        )
        .route(
            "/api/notifications/read-all",
            post(notification_handlers::mark_all_read),
        )
        .route(
            "/api/notifications/{id}",
            delete(notification_handlers::delete_notification),
        )
        .route(
            "/api/notifications/{id}/read",
            patch(notification_handlers::mark_read),
        )
        .route("/api/activity/me", get(activity::handlers::my_activity))
        .route("/api/activity/feed", get(activity::handlers::friends_feed))
        .route("/api/subscriptions/me", get(subscription::api::my_subscription))
        .route("/api/subscriptions/usage", get(subscription::api::get_usage_stats))
        .route(
            "/api/subscriptions/cancel",
            post(subscription::api::cancel_subscription),
        )
}
