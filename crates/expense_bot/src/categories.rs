//! Keyword based category suggestions.

use ledger::DEFAULT_CATEGORY;

/// Maps an expense description to a suggested category.
///
/// Suggestions are only proposals: the agent never applies one without the
/// user confirming it.
pub trait CategoryLookup: Send + Sync {
    fn suggest(&self, description: &str) -> String;
}

impl<F> CategoryLookup for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn suggest(&self, description: &str) -> String {
        self(description)
    }
}

/// Ordered keyword → category table.
///
/// Lookup is a substring search over the lowercased description, in table
/// order: the first keyword found wins, even if a later one is longer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CategoryDictionary {
    entries: Vec<(String, String)>,
}

impl CategoryDictionary {
    /// Appends `keywords` for `category` at the end of the table.
    pub fn with_group<I, K>(mut self, category: &str, keywords: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        for keyword in keywords {
            let keyword = keyword.as_ref().trim().to_lowercase();
            if keyword.is_empty() {
                continue;
            }
            self.entries.push((keyword, category.to_string()));
        }
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the category of the first keyword contained in `description`,
    /// or [`DEFAULT_CATEGORY`].
    pub fn suggest_category(&self, description: &str) -> &str {
        let description = description.to_lowercase();
        self.entries
            .iter()
            .find(|(keyword, _)| description.contains(keyword.as_str()))
            .map(|(_, category)| category.as_str())
            .unwrap_or(DEFAULT_CATEGORY)
    }

    /// Built-in Portuguese keyword table.
    pub fn builtin() -> Self {
        Self::default()
            .with_group(
                "Food",
                [
                    "supermercado", "mercado", "restaurante", "lanche", "almoço", "almoco",
                    "jantar", "café", "cafe", "padaria", "pizza", "ifood", "açougue", "feira",
                    "hamburguer", "sorvete",
                ],
            )
            .with_group(
                "Transport",
                [
                    "uber", "táxi", "taxi", "ônibus", "onibus", "metrô", "metro", "gasolina",
                    "combustível", "combustivel", "estacionamento", "pedágio", "pedagio",
                ],
            )
            .with_group(
                "Entertainment",
                [
                    "cinema", "teatro", "show", "netflix", "spotify", "jogo", "festa",
                    "ingresso", "bar",
                ],
            )
            .with_group(
                "Health",
                [
                    "farmácia", "farmacia", "remédio", "remedio", "médico", "medico",
                    "dentista", "academia", "hospital", "exame",
                ],
            )
            .with_group(
                "Housing",
                [
                    "aluguel", "condomínio", "condominio", "luz", "água", "agua", "gás",
                    "internet",
                ],
            )
            .with_group(
                "Education",
                ["curso", "livro", "escola", "faculdade", "mensalidade"],
            )
            .with_group(
                "Shopping",
                ["roupa", "sapato", "shopping", "presente", "loja"],
            )
            .with_group("Bills", ["boleto", "fatura", "celular", "conta"])
    }
}

impl CategoryLookup for CategoryDictionary {
    fn suggest(&self, description: &str) -> String {
        self.suggest_category(description).to_string()
    }
}
