mod admin_test;
mod auth_test;
mod billing_test;
mod blog_test;
mod challenges_test;
mod chat_test;
mod gamification_test;
mod groups_test;
mod middleware_test;
mod notifications_test;
mod realtime_test;
mod social_test;
