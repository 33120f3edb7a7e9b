// src/vendas/vendas_router.rs

use actix_web::{get, post, web, HttpResponse};
use tracing::{error, info};

// Importa o AppState do módulo raiz (main.rs)
use crate::AppState;
// Importa GenericResponse do módulo shared_structs
use crate::shared::shared_structs::GenericResponse;
// Importa o extrator de autenticação
use crate::usuarios::auth_middleware::UsuarioAutenticado;
// Importa o motor e as structs de vendas
use super::vendas_armazem::ArmazemVendas;
use super::vendas_erro::VendaErro;
use super::vendas_motor::processar_venda;
use super::vendas_structs::{FiltroRelatorio, ItemVenda};

/// Rota para realizar uma venda de produtos.
///
/// O corpo da requisição é um array de itens `{codigo, quantidade}`. O motor
/// de vendas valida e aplica todos os itens como uma única unidade atômica:
/// ou o estoque inteiro é decrementado e cada item gera um registro de venda,
/// ou nada é alterado e o erro do primeiro item que falhou é retornado.
#[post("/vendas")]
pub async fn realizar_venda(
    data: web::Data<AppState>,
    usuario: UsuarioAutenticado,
    itens: web::Json<Vec<ItemVenda>>,
) -> HttpResponse {
    match processar_venda(data.armazem.as_ref(), &itens).await {
        Ok(venda) => {
            info!(
                "Venda de {} item(ns) realizada por {}",
                venda.itens_registrados, usuario.email
            );
            HttpResponse::Ok().json(GenericResponse::sucesso(
                "Venda realizada e estoque atualizado!",
                venda,
            ))
        }
        Err(erro) => resposta_de_erro(erro),
    }
}

/// Converte o erro do motor de vendas na resposta HTTP correspondente.
/// Falhas de negócio são 400; tempo esgotado é 503 (o cliente pode reenviar);
/// qualquer outra falha de armazenamento é 500.
fn resposta_de_erro(erro: VendaErro) -> HttpResponse {
    error!("Erro ao processar a venda: {}", erro);

    match &erro {
        VendaErro::RequisicaoInvalida(_)
        | VendaErro::ProdutoNaoEncontrado(_)
        | VendaErro::EstoqueInsuficiente { .. } => {
            HttpResponse::BadRequest().json(GenericResponse::erro(erro.to_string()))
        }
        VendaErro::TempoEsgotado => HttpResponse::ServiceUnavailable().json(
            GenericResponse::erro("O estoque está ocupado no momento. Tente novamente."),
        ),
        VendaErro::Armazenamento(_) => HttpResponse::InternalServerError()
            .json(GenericResponse::erro("Erro interno ao processar venda")),
    }
}

/// Rota para consultar o relatório de vendas.
///
/// Retorna os registros de venda confirmados unidos ao nome atual do produto
/// (código, nome, quantidade, preço, data da venda). O intervalo de datas da
/// query string só é aplicado quando as duas datas são informadas.
#[get("/vendas/relatorio")]
pub async fn relatorio_vendas(
    data: web::Data<AppState>,
    _usuario: UsuarioAutenticado,
    filtro: web::Query<FiltroRelatorio>,
) -> HttpResponse {
    let consulta = data
        .armazem
        .consultar_vendas(filtro.data_inicio, filtro.data_fim)
        .await;

    match consulta {
        Ok(linhas) => {
            HttpResponse::Ok().json(GenericResponse::sucesso("Relatório de vendas", linhas))
        }
        Err(e) => {
            error!("Erro ao gerar o relatório de vendas: {}", e);
            HttpResponse::InternalServerError()
                .json(GenericResponse::erro("Erro ao gerar o relatório de vendas"))
        }
    }
}
