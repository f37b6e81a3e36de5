diesel::table! {
    accounts (id) {
        id -> Text,
        name -> Text,
        account_type -> Text,
        cleared_balance -> Double,
        email_domain -> Nullable<Text>,
        is_active -> Bool,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    categories (id) {
        id -> Text,
        name -> Text,
        group_name -> Text,
        assigned -> Double,
        activity -> Double,
        available -> Double,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    transactions (id) {
        id -> Text,
        transaction_date -> Text,
        payee -> Text,
        amount -> Double,
        category_id -> Nullable<Text>,
        account_id -> Text,
        status -> Text,
        original_email_id -> Nullable<Text>,
        notes -> Nullable<Text>,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    transaction_flags (id) {
        id -> Text,
        transaction_id -> Text,
        reason -> Text,
        message -> Text,
        created_at -> Text,
        resolved -> Bool,
    }
}

diesel::table! {
    auth_tokens (user_id) {
        user_id -> Text,
        refresh_token -> Text,
        access_token -> Nullable<Text>,
        expires_at -> Nullable<Text>,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    import_runs (id) {
        id -> Text,
        user_id -> Text,
        started_at -> Text,
        completed_at -> Nullable<Text>,
        status -> Text,
        imported_count -> Integer,
        skipped_count -> Integer,
        last_message_id -> Nullable<Text>,
    }
}

diesel::table! {
    app_settings (setting_key) {
        setting_key -> Text,
        setting_value -> Text,
    }
}

diesel::joinable!(transactions -> accounts (account_id));
diesel::joinable!(transactions -> categories (category_id));
diesel::joinable!(transaction_flags -> transactions (transaction_id));

diesel::allow_tables_to_appear_in_same_query!(
    accounts,
    categories,
    transactions,
    transaction_flags,
    auth_tokens,
    import_runs,
    app_settings,
);
