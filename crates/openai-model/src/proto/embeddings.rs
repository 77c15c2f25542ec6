use serde::{Deserialize, Serialize};

use crate::Error;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct EmbeddingRequest {
    pub model: String,
    pub input: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct EmbeddingResponse {
    pub data: Vec<Embedding>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Embedding {
    pub embedding: Vec<f32>,
}

impl EmbeddingResponse {
    /// Takes the vector of the first (and only) input.
    pub fn into_vector(self) -> Result<Vec<f32>, Error> {
        let Some(first) = self.data.into_iter().next() else {
            return Err(Error::malformed("embedding response has no data"));
        };
        if first.embedding.is_empty() {
            return Err(Error::malformed("embedding vector is empty"));
        }
        Ok(first.embedding)
    }
}

#[cfg(test)]
mod tests {
    use hermitclaw_model::{ErrorKind, ModelProviderError};
    use serde_json::json;

    use super::*;

    #[test]
    fn test_into_vector() {
        let resp: EmbeddingResponse = serde_json::from_value(json!({
            "object": "list",
            "data": [
                { "object": "embedding", "index": 0, "embedding": [0.5, -1.0, 0.25] }
            ],
            "model": "text-embedding-3-small"
        }))
        .unwrap();
        assert_eq!(resp.into_vector().unwrap(), [0.5, -1.0, 0.25]);

        let resp = EmbeddingResponse { data: vec![] };
        assert_eq!(
            resp.into_vector().unwrap_err().kind(),
            ErrorKind::MalformedResponse
        );
    }
}
