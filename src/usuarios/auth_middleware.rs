// src/usuarios/auth_middleware.rs

use actix_web::{dev::Payload, error::ErrorUnauthorized, web, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use tracing::error;

// Importa as Claims do módulo de structs de usuário
use super::usuario_structs::Claims;
// Importa o AppState do módulo raiz (main.rs)
use crate::AppState;

/// Usuário autenticado extraído do token JWT da requisição.
/// As rotas que exigem autenticação recebem essa struct como parâmetro.
#[derive(Debug, Clone)]
pub struct UsuarioAutenticado {
    pub id: i32,
    pub nome: String,
    pub email: String,
}

/// Extrai o token do cabeçalho "Authorization: Bearer <token>".
fn extrair_token(req: &HttpRequest) -> Result<String, &'static str> {
    let header_value = req
        .headers()
        .get("Authorization")
        .ok_or("Token de autenticação ausente.")?;

    let header_str = header_value
        .to_str()
        .map_err(|_| "Token de autenticação inválido.")?;

    match header_str.strip_prefix("Bearer ") {
        Some(token) => Ok(token.to_string()),
        None => Err("Formato de token inválido. Esperado 'Bearer <token>'."),
    }
}

/// Extrator de autenticação para Actix Web.
/// Valida o token JWT da requisição contra a chave secreta do AppState.
impl FromRequest for UsuarioAutenticado {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        // Acessa o AppState para obter a chave secreta JWT
        let jwt_secret = match req.app_data::<web::Data<AppState>>() {
            Some(state) => state.jwt_secret.clone(),
            None => {
                error!("AppState indisponível no extrator de autenticação.");
                return ready(Err(ErrorUnauthorized("Erro de configuração do servidor.")));
            }
        };

        let token = match extrair_token(req) {
            Ok(token) => token,
            Err(mensagem) => return ready(Err(ErrorUnauthorized(mensagem))),
        };

        // Decodifica e valida o token (a expiração é validada por padrão)
        let validation = Validation::new(Algorithm::HS256);
        let token_data = match decode::<Claims>(
            &token,
            &DecodingKey::from_secret(jwt_secret.as_ref()),
            &validation,
        ) {
            Ok(data) => data,
            Err(e) => {
                error!("Erro ao decodificar/validar JWT: {:?}", e);
                let mensagem = match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => "Token expirado.",
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        "Assinatura do token inválida."
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidToken => "Token malformado.",
                    _ => "Token de autenticação inválido.",
                };
                return ready(Err(ErrorUnauthorized(mensagem)));
            }
        };

        ready(Ok(UsuarioAutenticado {
            id: token_data.claims.sub,
            nome: token_data.claims.name,
            email: token_data.claims.email,
        }))
    }
}
