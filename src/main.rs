// src/main.rs

use std::sync::Arc;
use std::time::Duration;

use actix_web::{web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use tracing::info;
use tracing_subscriber::EnvFilter;

// Importa os módulos
//
// O Rust encontrará o arquivo `src/<modulo>/mod.rs` e, a partir dele, os submódulos.
mod produtos; // Módulo de produtos
mod vendas;   // Módulo de vendas
mod shared;   // Módulo shared
mod usuarios; // Módulo de usuários

use vendas::vendas_armazem::{ArmazemPostgres, ArmazemVendas};

// Estado compartilhado entre as rotas: o pool de conexões, a chave secreta
// JWT e o armazém de vendas injetado no motor.
pub struct AppState {
    pub db_pool: Pool<Postgres>,
    pub jwt_secret: String,
    pub armazem: Arc<dyn ArmazemVendas>,
}

// Função principal da aplicação Actix Web.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Logs estruturados; o nível vem de RUST_LOG (padrão: info)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // URL de conexão com o banco de dados PostgreSQL.
    // As colunas 'preco', 'peso' e 'volume' devem ser NUMERIC ou DECIMAL
    // para garantir a compatibilidade com bigdecimal::BigDecimal.
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL deve estar definida no ambiente");

    // Conecta ao banco de dados PostgreSQL usando um pool de conexões.
    // A espera por uma conexão é limitada para que uma venda não bloqueie
    // indefinidamente.
    let db_pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&database_url)
        .await
        .expect("Falha ao conectar ao banco PostgreSQL");

    // Chave secreta para assinar e validar os tokens JWT
    let jwt_secret = std::env::var("JWT_SECRET").expect("JWT_SECRET deve estar definida no ambiente");

    // Porta do servidor (padrão: 8080)
    let porta = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());

    // O armazém de vendas sobre o Postgres é o backend injetado no motor.
    let armazem: Arc<dyn ArmazemVendas> = Arc::new(ArmazemPostgres::new(db_pool.clone()));

    // Cria um estado compartilhado da aplicação.
    // web::Data é usado para compartilhar dados imutáveis entre as rotas.
    let app_state = web::Data::new(AppState {
        db_pool,
        jwt_secret,
        armazem,
    });

    info!("Iniciando API Vendario na porta {}...", porta);

    // Configura e inicia o servidor HTTP.
    HttpServer::new(move || {
        App::new()
            // Adiciona o estado compartilhado à aplicação.
            // .clone() é necessário porque a closure é movida
            // e pode ser executada várias vezes.
            .app_data(app_state.clone())

            // Módulo de Produtos
            .service(produtos::produtos_router::buscar_produtos)
            .service(produtos::produtos_router::buscar_produto_por_codigo)
            .service(produtos::produtos_router::cadastrar_produto)
            .service(produtos::produtos_router::atualizar_produto)
            .service(produtos::produtos_router::deletar_produto)

            // Módulo de Vendas
            .service(vendas::vendas_router::realizar_venda)
            .service(vendas::vendas_router::relatorio_vendas)

            // Módulo de Usuários
            .service(usuarios::usuario_router::cadastrar_usuario)
            .service(usuarios::usuario_router::login_usuario)
            .service(usuarios::usuario_router::atualizar_senha)
    })
    // Vincula o servidor ao endereço IP e porta. O '?' propaga erros.
    .bind(format!("127.0.0.1:{}", porta))?
    // Inicia o servidor.
    .run()
    // Aguarda a finalização do servidor.
    .await
}
