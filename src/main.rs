use anyhow::{bail, Context};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use agora::api::{ForumApi, UserSortKey};
use agora::config::{Cli, Command, Config, OrderArg, SortArg, SourceArg, StatusArg, UserSortArg};
use agora::models::{CategoryId, CommentId, EnrichedComment, EnrichedPost, PostId, UserId};
use agora::query::{category_filter_for, FilterPatch, ListSource, SortKey, SortOrder, StatusFilter};
use agora::reaction::{ReactionIntent, ReactionStatus, ReactionTarget};
use agora::{ForumClient, HttpForumApi};

type Client = ForumClient<HttpForumApi>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let config = Config::load(&cli)?;
    tracing::info!("API at {}", config.api.base_url);

    let api = HttpForumApi::from_config(&config.api)?;
    let client = ForumClient::with_debounce(api, config.debounce());

    if let Some(user_id) = config.session.user_id {
        client.api().set_session(config.session()).await;
        let viewer = client
            .get_user(UserId(user_id))
            .await
            .context("Could not load the signed-in user")?;
        client.sign_in(viewer, config.session()).await;
    }

    run(&client, &config, cli.command).await
}

async fn run(client: &Client, config: &Config, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Posts {
            source,
            user,
            title,
            categories,
            from,
            to,
            sort,
            order,
            status,
            page,
        } => {
            let owner = user.or(config.session.user_id).map(UserId);
            let source = match (source, owner) {
                (SourceArg::All, _) => ListSource::All,
                (SourceArg::User, Some(id)) => ListSource::User(id),
                (SourceArg::Favorites, Some(id)) => ListSource::Favorites(id),
                (_, None) => bail!("--user is required for this list"),
            };

            let ids: Vec<CategoryId> = categories.into_iter().map(CategoryId).collect();
            let mut patch = FilterPatch::date_range(from, to);
            patch.search_title = title;
            patch.category_filters = Some(category_filter_for(&ids));
            patch.status_filter = Some(status_filter(status));

            client
                .set_query(source, patch, sort_key(sort), sort_order(order))
                .await?;
            if page != 1 && !client.set_page(source, page).await? {
                bail!("Page {} is out of range", page);
            }

            let state = client.state().await;
            if let Some(list) = state.posts.list(source) {
                for post in &list.posts {
                    print_post_line(post);
                }
                println!(
                    "page {}/{} ({} found)",
                    list.query.current_page,
                    list.total_pages(),
                    list.found
                );
            }
        }
        Command::Post { id } => {
            let post = client.get_post(PostId(id)).await?;
            let status = client
                .fetch_reaction_status(ReactionTarget::Post(PostId(id)))
                .await?;
            print_post(&post, status);
        }
        Command::LikePost { id } => react_to_post(client, PostId(id), ReactionIntent::Like).await?,
        Command::DislikePost { id } => react_to_post(client, PostId(id), ReactionIntent::Dislike).await?,
        Command::UnreactPost { id } => react_to_post(client, PostId(id), ReactionIntent::Remove).await?,
        Command::Comments { post_id } => {
            client.fetch_comments(PostId(post_id)).await?;
            let state = client.state().await;
            for thread in state.comments.thread() {
                print_comment(thread.comment, 0);
                for reply in thread.replies {
                    print_comment(reply, 1);
                }
            }
        }
        Command::LikeComment { post, id } => {
            react_to_comment(client, PostId(post), CommentId(id), ReactionIntent::Like).await?
        }
        Command::DislikeComment { post, id } => {
            react_to_comment(client, PostId(post), CommentId(id), ReactionIntent::Dislike).await?
        }
        Command::Categories { page, title } => {
            let categories = client.list_categories(page, &title).await?;
            for category in &categories.items {
                println!("[{}] {} - {}", category.id, category.title, category.description);
            }
            println!("{} found", categories.found);
        }
        Command::Users { page, sort, order } => {
            let sort_by = match sort {
                UserSortArg::Login => UserSortKey::Login,
                UserSortArg::Rating => UserSortKey::Rating,
            };
            client.set_users_sort(sort_by, sort_order(order)).await?;
            if page != 1 && !client.set_users_page(page).await? {
                bail!("Page {} is out of range", page);
            }
            let state = client.state().await;
            for user in &state.users.list {
                println!("[{}] {} ({}) rating {}", user.id, user.login, user.full_name, user.rating);
            }
        }
    }

    Ok(())
}

async fn react(client: &Client, target: ReactionTarget, intent: ReactionIntent) -> anyhow::Result<()> {
    if client.viewer().await.is_none() {
        bail!("Sign in first: pass --user-id and --access-token or set them in config.toml");
    }
    client.fetch_reaction_status(target).await?;
    let status = client.react(target, intent).await?;
    if let Some(state) = client.read(|s| s.reaction_state(target)).await {
        println!(
            "{}: {} (likes {}, dislikes {}, rating {})",
            target,
            status.state_name(),
            state.counters.likes,
            state.counters.dislikes,
            state.counters.rating
        );
    }
    Ok(())
}

async fn react_to_post(client: &Client, id: PostId, intent: ReactionIntent) -> anyhow::Result<()> {
    client.get_post(id).await?;
    react(client, ReactionTarget::Post(id), intent).await
}

async fn react_to_comment(
    client: &Client,
    post: PostId,
    id: CommentId,
    intent: ReactionIntent,
) -> anyhow::Result<()> {
    client.fetch_comments(post).await?;
    react(client, ReactionTarget::Comment(id), intent).await
}

fn sort_key(arg: SortArg) -> SortKey {
    match arg {
        SortArg::Rating => SortKey::Rating,
        SortArg::CreatedAt => SortKey::CreatedAt,
    }
}

fn sort_order(arg: OrderArg) -> SortOrder {
    match arg {
        OrderArg::Asc => SortOrder::Asc,
        OrderArg::Desc => SortOrder::Desc,
    }
}

fn status_filter(arg: StatusArg) -> StatusFilter {
    match arg {
        StatusArg::Active => StatusFilter::Active,
        StatusArg::Inactive => StatusFilter::Inactive,
        StatusArg::Both => StatusFilter::Both,
    }
}

fn author(login: Option<&str>) -> &str {
    login.unwrap_or("unknown")
}

fn print_post_line(post: &EnrichedPost) {
    let p = &post.record;
    println!(
        "[{}] {} by {} | +{} -{} rating {} | {}",
        p.id,
        p.title,
        author(post.user.as_ref().map(|u| u.login.as_str())),
        p.likes,
        p.dislikes,
        p.rating,
        p.status.as_str()
    );
}

fn print_post(post: &EnrichedPost, status: ReactionStatus) {
    print_post_line(post);
    let categories: Vec<_> = post.categories.iter().map(|c| c.title.as_str()).collect();
    if !categories.is_empty() {
        println!("categories: {}", categories.join(", "));
    }
    println!("your reaction: {}", status.state_name());
    println!();
    println!("{}", post.record.content);
}

fn print_comment(comment: &EnrichedComment, depth: usize) {
    let c = &comment.record;
    println!(
        "{}#{} {}: {} (+{} -{})",
        "  ".repeat(depth),
        c.id,
        author(comment.user.as_ref().map(|u| u.login.as_str())),
        c.content,
        c.likes,
        c.dislikes
    );
}
