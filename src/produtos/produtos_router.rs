// src/produtos/produtos_router.rs

use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use sqlx::query_as;
use tracing::error;

// Importa as structs definidas no módulo `produtos_structs` dentro da mesma pasta `produtos`
use super::produtos_structs::{AtualizaProduto, CadastroProdutos, FiltroProduto, Produto};

// Importa GenericResponse do módulo shared_structs
use crate::shared::shared_structs::GenericResponse;
// Importa o extrator de autenticação para proteger as rotas de escrita
use crate::usuarios::auth_middleware::UsuarioAutenticado;
// Importa o AppState do módulo raiz (main.rs)
use crate::AppState;

/// Rota para buscar todos os produtos, com filtro opcional por código na query string.
///
/// Executa uma consulta SQL na tabela 'produtos' e mapeia os resultados
/// para a estrutura `Produto`, serializada como JSON na resposta HTTP.
#[get("/produtos")]
pub async fn buscar_produtos(
    data: web::Data<AppState>,
    filtro: web::Query<FiltroProduto>,
) -> impl Responder {
    // Com filtro de código a consulta se restringe a um único produto
    let produtos_result = match &filtro.codigo {
        Some(codigo) => {
            query_as::<_, Produto>(
                "SELECT codigo, lote, nome, descricao, preco, quantidade, peso, volume \
                 FROM produtos WHERE codigo = $1",
            )
            .bind(codigo)
            .fetch_all(&data.db_pool)
            .await
        }
        None => {
            query_as::<_, Produto>(
                "SELECT codigo, lote, nome, descricao, preco, quantidade, peso, volume FROM produtos",
            )
            .fetch_all(&data.db_pool)
            .await
        }
    };

    match produtos_result {
        // Retorna a lista de produtos como JSON com status OK
        Ok(produtos) => HttpResponse::Ok().json(produtos),
        Err(e) => {
            error!("Erro ao buscar produtos: {:?}", e);
            HttpResponse::InternalServerError()
                .json(GenericResponse::erro("Erro ao buscar produtos"))
        }
    }
}

/// Rota para buscar um único produto pelo código.
#[get("/produtos/{codigo}")]
pub async fn buscar_produto_por_codigo(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> HttpResponse {
    let codigo = path.into_inner();
    let produto_result = query_as::<_, Produto>(
        "SELECT codigo, lote, nome, descricao, preco, quantidade, peso, volume \
         FROM produtos WHERE codigo = $1",
    )
    .bind(&codigo)
    .fetch_optional(&data.db_pool)
    .await;

    match produto_result {
        Ok(Some(produto)) => HttpResponse::Ok().json(produto),
        Ok(None) => HttpResponse::NotFound().json(GenericResponse::erro(format!(
            "Produto com código {} não encontrado.",
            codigo
        ))),
        Err(e) => {
            error!("Erro ao buscar produto {}: {:?}", codigo, e);
            HttpResponse::InternalServerError()
                .json(GenericResponse::erro("Erro ao buscar produto"))
        }
    }
}

/// Rota para cadastrar produtos no estoque.
///
/// Aceita um único produto ou um array de produtos no corpo da requisição.
/// O cadastro é um upsert: se o código já existe, o produto é atualizado em vez
/// de gerar um erro de chave duplicada.
#[post("/produtos")]
pub async fn cadastrar_produto(
    data: web::Data<AppState>,
    _usuario: UsuarioAutenticado,
    cadastro: web::Json<CadastroProdutos>,
) -> HttpResponse {
    let produtos = cadastro.into_inner().em_lista();

    if produtos.is_empty() {
        return HttpResponse::BadRequest()
            .json(GenericResponse::erro("Nenhum produto informado para cadastro."));
    }

    let total = produtos.len();

    for produto in produtos {
        // Executa a query SQL de upsert por código
        let result = sqlx::query(
            "INSERT INTO produtos (codigo, lote, nome, descricao, preco, quantidade, peso, volume) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (codigo) DO UPDATE SET \
             lote = EXCLUDED.lote, nome = EXCLUDED.nome, descricao = EXCLUDED.descricao, \
             preco = EXCLUDED.preco, quantidade = EXCLUDED.quantidade, \
             peso = EXCLUDED.peso, volume = EXCLUDED.volume",
        )
        .bind(&produto.codigo)     // Binda o código do produto
        .bind(&produto.lote)       // Binda o lote do produto
        .bind(&produto.nome)       // Binda o nome do produto
        .bind(&produto.descricao)  // Binda a descrição do produto
        .bind(&produto.preco)      // Binda o preço do produto (BigDecimal)
        .bind(produto.quantidade)  // Binda a quantidade em estoque
        .bind(&produto.peso)       // Binda o peso do produto
        .bind(&produto.volume)     // Binda o volume do produto
        .execute(&data.db_pool)
        .await;

        if let Err(e) = result {
            error!("Erro ao salvar produto {}: {:?}", produto.codigo, e);
            return HttpResponse::InternalServerError()
                .json(GenericResponse::erro("Erro ao salvar produtos"));
        }
    }

    HttpResponse::Ok().json(GenericResponse::ok(format!(
        "{} produto(s) salvo(s) com sucesso!",
        total
    )))
}

/// Rota para atualizar parcialmente um produto existente.
/// Apenas os campos presentes no corpo da requisição são alterados.
#[put("/produtos/{codigo}")]
pub async fn atualizar_produto(
    data: web::Data<AppState>,
    _usuario: UsuarioAutenticado,
    path: web::Path<String>,
    item: web::Json<AtualizaProduto>,
) -> HttpResponse {
    let codigo = path.into_inner();

    if item.vazia() {
        return HttpResponse::BadRequest().json(GenericResponse::erro(
            "Nenhum campo informado para atualização.",
        ));
    }

    // COALESCE mantém o valor atual da coluna quando o campo não veio na requisição
    let result = sqlx::query(
        "UPDATE produtos SET \
         lote = COALESCE($1, lote), nome = COALESCE($2, nome), \
         descricao = COALESCE($3, descricao), preco = COALESCE($4, preco), \
         quantidade = COALESCE($5, quantidade), peso = COALESCE($6, peso), \
         volume = COALESCE($7, volume) \
         WHERE codigo = $8",
    )
    .bind(&item.lote)
    .bind(&item.nome)
    .bind(&item.descricao)
    .bind(&item.preco)
    .bind(item.quantidade)
    .bind(&item.peso)
    .bind(&item.volume)
    .bind(&codigo)
    .execute(&data.db_pool)
    .await;

    match result {
        Ok(res) => {
            if res.rows_affected() > 0 {
                HttpResponse::Ok().json(GenericResponse::ok(format!(
                    "Produto com código {} atualizado com sucesso.",
                    codigo
                )))
            } else {
                HttpResponse::NotFound().json(GenericResponse::erro(format!(
                    "Produto com código {} não encontrado para atualização.",
                    codigo
                )))
            }
        }
        Err(e) => {
            error!("Erro ao atualizar produto {}: {:?}", codigo, e);
            HttpResponse::InternalServerError()
                .json(GenericResponse::erro("Erro ao atualizar produto."))
        }
    }
}

/// Rota para deletar um produto do estoque.
#[delete("/produtos/{codigo}")]
pub async fn deletar_produto(
    data: web::Data<AppState>,
    _usuario: UsuarioAutenticado,
    path: web::Path<String>,
) -> HttpResponse {
    let codigo = path.into_inner();
    let result = sqlx::query("DELETE FROM produtos WHERE codigo = $1")
        .bind(&codigo)
        .execute(&data.db_pool)
        .await;

    match result {
        Ok(res) => {
            if res.rows_affected() > 0 {
                HttpResponse::Ok().json(GenericResponse::ok(format!(
                    "Produto com código {} deletado com sucesso.",
                    codigo
                )))
            } else {
                HttpResponse::NotFound().json(GenericResponse::erro(format!(
                    "Produto com código {} não encontrado para exclusão.",
                    codigo
                )))
            }
        }
        Err(e) => {
            error!("Erro ao deletar produto {}: {:?}", codigo, e);
            HttpResponse::InternalServerError()
                .json(GenericResponse::erro("Erro ao deletar produto"))
        }
    }
}
