//! Per-language example commit messages used in the prompt preamble

use tracing::warn;

#[derive(Debug, PartialEq, Eq)]
pub struct Locale {
    pub code: &'static str,
    /// English name of the language, used in the instructions
    pub name: &'static str,
    pub commit_fix: &'static str,
    pub commit_feat: &'static str,
    pub commit_description: &'static str,
}

static LOCALES: &[Locale] = &[
    Locale {
        code: "en",
        name: "English",
        commit_fix: "fix(server): read the port from the PORT environment variable",
        commit_feat: "feat(server): log the listening address on startup",
        commit_description: "The port was hard-coded to 8080, which clashed with other local services. Reading it from the environment keeps 8080 as the default and makes the bound address visible in the logs.",
    },
    Locale {
        code: "de",
        name: "German",
        commit_fix: "fix(server): Port aus der Umgebungsvariable PORT lesen",
        commit_feat: "feat(server): Adresse beim Start im Log ausgeben",
        commit_description: "Der Port war fest auf 8080 gesetzt und kollidierte mit anderen lokalen Diensten. Jetzt wird er aus der Umgebung gelesen, 8080 bleibt der Standardwert und die gebundene Adresse erscheint im Log.",
    },
    Locale {
        code: "es",
        name: "Spanish",
        commit_fix: "fix(server): leer el puerto de la variable de entorno PORT",
        commit_feat: "feat(server): registrar la dirección de escucha al arrancar",
        commit_description: "El puerto estaba fijado en 8080 y chocaba con otros servicios locales. Ahora se lee del entorno, 8080 sigue siendo el valor por defecto y la dirección aparece en los registros.",
    },
    Locale {
        code: "fr",
        name: "French",
        commit_fix: "fix(server): lire le port depuis la variable d'environnement PORT",
        commit_feat: "feat(server): journaliser l'adresse d'écoute au démarrage",
        commit_description: "Le port était fixé à 8080 et entrait en conflit avec d'autres services locaux. Il est désormais lu depuis l'environnement, 8080 reste la valeur par défaut et l'adresse apparaît dans les journaux.",
    },
    Locale {
        code: "ja",
        name: "Japanese",
        commit_fix: "fix(server): ポートを環境変数 PORT から読み込む",
        commit_feat: "feat(server): 起動時に待ち受けアドレスをログに出力する",
        commit_description: "ポートが 8080 に固定されており、他のローカルサービスと衝突していました。環境変数から読み込むようにし、既定値は 8080 のまま、待ち受けアドレスをログで確認できるようにしました。",
    },
    Locale {
        code: "zh_CN",
        name: "Simplified Chinese",
        commit_fix: "fix(server): 从环境变量 PORT 读取端口",
        commit_feat: "feat(server): 启动时记录监听地址",
        commit_description: "端口原先固定为 8080，会与其他本地服务冲突。现在从环境变量读取端口，默认仍为 8080，并在日志中输出监听地址。",
    },
    Locale {
        code: "pt_br",
        name: "Brazilian Portuguese",
        commit_fix: "fix(server): ler a porta da variável de ambiente PORT",
        commit_feat: "feat(server): registrar o endereço de escuta na inicialização",
        commit_description: "A porta estava fixa em 8080 e conflitava com outros serviços locais. Agora ela é lida do ambiente, 8080 continua sendo o padrão e o endereço aparece nos logs.",
    },
    Locale {
        code: "ru",
        name: "Russian",
        commit_fix: "fix(server): читать порт из переменной окружения PORT",
        commit_feat: "feat(server): выводить адрес прослушивания в лог при запуске",
        commit_description: "Порт был жёстко задан как 8080 и конфликтовал с другими локальными сервисами. Теперь он читается из окружения, 8080 остаётся значением по умолчанию, а адрес выводится в лог.",
    },
];

/// Look up a locale by code. Case and `-`/`_` are ignored, so `pt-BR`
/// matches `pt_br`.
pub fn locale_for(code: &str) -> Option<&'static Locale> {
    let wanted = code.trim().replace('-', "_");
    LOCALES
        .iter()
        .find(|locale| locale.code.eq_ignore_ascii_case(&wanted))
}

/// Like [`locale_for`], falling back to English.
pub fn resolve_locale(code: &str) -> &'static Locale {
    locale_for(code).unwrap_or_else(|| {
        warn!(language = code, "unsupported language, using English");
        &LOCALES[0]
    })
}
