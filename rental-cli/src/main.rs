use std::fs;
use std::io;
use std::path::Path;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rental_client::{
    ListPostsResponse, MapBounds, NewPost, Post, PostStatus, RentalClient, RentalClientError,
};

const TOKEN_FILE: &str = ".rental_token";
const DEFAULT_HTTP_SERVER: &str = "http://127.0.0.1:8080";

#[derive(Debug, Parser)]
#[command(name = "rental-cli", version, about = "CLI клиент для rental-server")]
struct Cli {
    /// Адрес сервера.
    #[arg(long, global = true, env = "RENTAL_SERVER")]
    server: Option<String>,

    /// Вывести ответ сервера как JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Сохранить JWT, выданный провайдером идентификации.
    SetToken {
        #[arg(long)]
        token: String,
    },
    /// Удалить сохранённый токен.
    Logout,
    /// Объявления в области карты.
    Map {
        #[arg(long, allow_negative_numbers = true)]
        south: f64,
        #[arg(long, allow_negative_numbers = true)]
        west: f64,
        #[arg(long, allow_negative_numbers = true)]
        north: f64,
        #[arg(long, allow_negative_numbers = true)]
        east: f64,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Объявление по id.
    Get {
        #[arg(long)]
        id: i64,
    },
    /// Мои объявления (требует токен).
    Mine {
        #[arg(long, default_value_t = 20)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Публикация объявления (требует токен).
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        price: i64,
        #[arg(long)]
        address: String,
        #[arg(long, allow_negative_numbers = true)]
        latitude: f64,
        #[arg(long, allow_negative_numbers = true)]
        longitude: f64,
    },
    /// Продление на 14 дней (требует токен).
    Bump {
        #[arg(long)]
        id: i64,
    },
    /// Скрыть или показать объявление (требует токен).
    Toggle {
        #[arg(long)]
        id: i64,
    },
    /// Отметить как сданное (требует токен).
    Rented {
        #[arg(long)]
        id: i64,
    },
    /// Команды администратора.
    #[command(subcommand)]
    Admin(AdminCommand),
    /// Перевести просроченные объявления в `expired`.
    Expire {
        /// Секрет планировщика.
        #[arg(long, env = "CRON_SECRET")]
        secret: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum AdminCommand {
    /// Все объявления, включая удалённые.
    List {
        #[arg(long)]
        status: Option<PostStatus>,
        #[arg(long, default_value_t = 50)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Удалить объявление.
    Delete {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        reason: String,
    },
    /// Принудительно сменить статус.
    Status {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        status: PostStatus,
    },
    /// Заблокировать профиль.
    Lock {
        #[arg(long)]
        id: i64,
    },
    /// Разблокировать профиль.
    Unlock {
        #[arg(long)]
        id: i64,
    },
    /// Счётчики.
    Stats,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Ошибка: {err}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let server = normalize_server(
        cli.server
            .unwrap_or_else(|| DEFAULT_HTTP_SERVER.to_string()),
    );
    let mut client = RentalClient::new(server).map_err(map_client_error)?;

    if let Some(token) = load_token().context("не удалось прочитать .rental_token")? {
        client.set_token(token);
    }
    let json = cli.json;

    match cli.command {
        Command::SetToken { token } => {
            let token = parse_token_content(&token).context("токен пуст")?;
            client.set_token(token);
            persist_token(&client).context("не удалось сохранить токен")?;
            println!("Токен сохранён в {TOKEN_FILE}");
        }
        Command::Logout => {
            client.clear_token();
            if Path::new(TOKEN_FILE).exists() {
                fs::remove_file(TOKEN_FILE).context("не удалось удалить токен")?;
            }
            println!("Токен удалён");
        }
        Command::Map {
            south,
            west,
            north,
            east,
            limit,
        } => {
            let bounds = MapBounds {
                south,
                west,
                north,
                east,
            };
            let map = client
                .list_map(bounds, limit)
                .await
                .map_err(map_client_error)?;
            if json {
                print_json(&map.posts)?;
            } else {
                println!(
                    "Объявлений на карте: {}{}",
                    map.posts.len(),
                    if map.crosses_antimeridian {
                        " (через антимеридиан)"
                    } else {
                        ""
                    }
                );
                for post in &map.posts {
                    print_post_line(post);
                }
            }
        }
        Command::Get { id } => {
            let post = client.get_post(id).await.map_err(map_client_error)?;
            print_post("Объявление", &post, json)?;
        }
        Command::Mine { limit, offset } => {
            let list = client
                .list_mine(limit, offset)
                .await
                .map_err(map_client_error)?;
            print_list(&list, json)?;
        }
        Command::Create {
            title,
            description,
            price,
            address,
            latitude,
            longitude,
        } => {
            let post = client
                .create_post(&NewPost {
                    title,
                    description,
                    price,
                    address,
                    latitude,
                    longitude,
                })
                .await
                .map_err(map_client_error)?;
            print_post("Объявление опубликовано", &post, json)?;
        }
        Command::Bump { id } => {
            let bumped = client.bump(id).await.map_err(map_client_error)?;
            println!("Объявление продлено до {}", bumped.expires_at);
        }
        Command::Toggle { id } => {
            let status = client
                .toggle_visibility(id)
                .await
                .map_err(map_client_error)?;
            println!("Новый статус: {status}");
        }
        Command::Rented { id } => {
            client.mark_as_rented(id).await.map_err(map_client_error)?;
            println!("Объявление отмечено как сданное: id={id}");
        }
        Command::Admin(command) => run_admin(&client, command, json).await?,
        Command::Expire { secret } => {
            let count = client
                .expire_posts(secret.as_deref())
                .await
                .map_err(map_client_error)?;
            println!("Просрочено объявлений: {count}");
        }
    }

    Ok(())
}

async fn run_admin(client: &RentalClient, command: AdminCommand, json: bool) -> Result<()> {
    match command {
        AdminCommand::List {
            status,
            limit,
            offset,
        } => {
            let list = client
                .admin_list_posts(status, limit, offset)
                .await
                .map_err(map_client_error)?;
            print_list(&list, json)?;
        }
        AdminCommand::Delete { id, reason } => {
            client
                .admin_delete(id, &reason)
                .await
                .map_err(map_client_error)?;
            println!("Объявление удалено: id={id}");
        }
        AdminCommand::Status { id, status } => {
            let post = client
                .force_status(id, status)
                .await
                .map_err(map_client_error)?;
            print_post("Статус изменён", &post, json)?;
        }
        AdminCommand::Lock { id } => set_lock(client, id, true).await?,
        AdminCommand::Unlock { id } => set_lock(client, id, false).await?,
        AdminCommand::Stats => {
            let stats = client.stats().await.map_err(map_client_error)?;
            if json {
                print_json(&stats)?;
            } else {
                println!("Объявления по статусам:");
                for (status, count) in &stats.posts_by_status {
                    println!("  {status}: {count}");
                }
                println!("Профили по ролям:");
                for (role, count) in &stats.profiles_by_role {
                    println!("  {role}: {count}");
                }
            }
        }
    }
    Ok(())
}

async fn set_lock(client: &RentalClient, id: i64, is_locked: bool) -> Result<()> {
    let result = client
        .lock_user(id, is_locked)
        .await
        .map_err(map_client_error)?;
    println!("{} (id={id}, заблокирован: {})", result.message, result.is_locked);
    Ok(())
}

fn normalize_server(server: String) -> String {
    if server.starts_with("http://") || server.starts_with("https://") {
        return server;
    }

    format!("http://{server}")
}

fn parse_token_content(raw: &str) -> Option<String> {
    let token = raw.trim().to_string();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

fn load_token() -> io::Result<Option<String>> {
    if !Path::new(TOKEN_FILE).exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(TOKEN_FILE)?;
    Ok(parse_token_content(&raw))
}

fn persist_token(client: &RentalClient) -> io::Result<()> {
    if let Some(token) = client.get_token() {
        fs::write(TOKEN_FILE, token)?;
    }
    Ok(())
}

fn map_client_error(err: RentalClientError) -> anyhow::Error {
    let message = match err {
        RentalClientError::Unauthorized => {
            "требуется авторизация: выполните `rental-cli set-token --token ...`".to_string()
        }
        RentalClientError::Forbidden(message) => format!("доступ запрещён: {message}"),
        RentalClientError::NotFound => "ресурс не найден".to_string(),
        RentalClientError::InvalidRequest { code, message } => {
            format!("некорректный запрос [{code}]: {message}")
        }
        RentalClientError::RateLimited { retry_after } => match retry_after {
            Some(after) => format!("слишком много запросов, повторите через {}с", after.as_secs()),
            None => "слишком много запросов".to_string(),
        },
        RentalClientError::Server(message) => format!("ошибка сервера: {message}"),
        RentalClientError::Http(err) => format!("ошибка HTTP: {err}"),
    };
    anyhow::anyhow!(message)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_post(title: &str, post: &Post, json: bool) -> Result<()> {
    if json {
        return print_json(post);
    }
    println!("{title}");
    println!("id: {}", post.id);
    println!("title: {}", post.title);
    println!("status: {}", post.status);
    println!("price: {}", post.price);
    println!("address: {}", post.address);
    println!("coordinates: {}, {}", post.latitude, post.longitude);
    match post.expires_at {
        Some(at) => println!("expires_at: {at}"),
        None => println!("expires_at: -"),
    }
    println!("created_by: {}", post.created_by);
    println!("updated_at: {}", post.updated_at);
    if let Some(reason) = &post.deletion_reason {
        println!("deletion_reason: {reason}");
    }
    Ok(())
}

fn print_post_line(post: &Post) {
    println!(
        "- [{}] {} ({}, {}) status={}",
        post.id, post.title, post.price, post.address, post.status
    );
}

fn print_list(list: &ListPostsResponse, json: bool) -> Result<()> {
    if json {
        return print_json(list);
    }
    println!(
        "Объявлений: {} (limit={}, offset={}, total={})",
        list.posts.len(),
        list.limit,
        list.offset,
        list.total
    );
    for post in &list.posts {
        print_post_line(post);
    }
    Ok(())
}
