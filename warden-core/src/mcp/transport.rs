use std::collections::{BTreeSet, HashMap};
use std::path::Path;

/// How to reach one MCP tool server.
#[derive(Debug, Clone)]
pub struct McpServerConfig {
    pub name: String,
    pub transport: McpTransport,
    exposed: Exposure,
}

/// Which of a server's tools the mediator may see and call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum Exposure {
    #[default]
    All,
    Only(BTreeSet<String>),
    AllExcept(BTreeSet<String>),
}

impl McpServerConfig {
    /// Tool names are passed through unchanged so stored policies keep
    /// matching the names the server advertises.
    pub fn new(name: impl Into<String>, transport: impl Into<McpTransport>) -> Self {
        Self {
            name: name.into(),
            transport: transport.into(),
            exposed: Exposure::All,
        }
    }

    /// Hide every tool not named here.
    ///
    /// ```
    /// # use warden_core::mcp::{McpServerConfig, McpTransport};
    /// let config = McpServerConfig::new("files", McpTransport::stdio("python").arg("server.py"))
    ///     .only_tools(["read_file", "write_file"]);
    /// assert!(config.exposes("read_file"));
    /// assert!(!config.exposes("delete_file"));
    /// ```
    pub fn only_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exposed = Exposure::Only(tools.into_iter().map(Into::into).collect());
        self
    }

    /// Hide the named tools.
    pub fn exclude_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exposed = Exposure::AllExcept(tools.into_iter().map(Into::into).collect());
        self
    }

    pub fn exposes(&self, tool_name: &str) -> bool {
        match &self.exposed {
            Exposure::All => true,
            Exposure::Only(names) => names.contains(tool_name),
            Exposure::AllExcept(names) => !names.contains(tool_name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum McpTransport {
    /// Spawn a child process and speak MCP over its stdin/stdout.
    Stdio {
        command: String,
        args: Vec<String>,
        env: HashMap<String, String>,
    },
    /// Streamable HTTP endpoint. Headers are sent with every request.
    Http {
        url: String,
        headers: HashMap<String, String>,
    },
}

impl McpTransport {
    pub fn stdio(command: impl Into<String>) -> StdioBuilder {
        StdioBuilder {
            command: command.into(),
            args: Vec::new(),
            env: HashMap::new(),
        }
    }

    pub fn http(url: impl Into<String>) -> HttpBuilder {
        HttpBuilder {
            url: url.into(),
            headers: HashMap::new(),
        }
    }

    /// Stdio transport for a server given as a command line.
    ///
    /// A bare Python script is run with `python`.
    ///
    /// ```
    /// # use warden_core::mcp::McpTransport;
    /// let transport = McpTransport::launch("file_server.py", ["--root", "/tmp"]);
    /// assert_eq!(
    ///     transport,
    ///     McpTransport::stdio("python").args(["file_server.py", "--root", "/tmp"]).build()
    /// );
    /// ```
    pub fn launch<I, S>(command: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let is_script = Path::new(command)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("py"));
        if is_script {
            McpTransport::stdio("python").arg(command).args(args).build()
        } else {
            McpTransport::stdio(command).args(args).build()
        }
    }
}

#[derive(Debug, Clone)]
pub struct StdioBuilder {
    command: String,
    args: Vec<String>,
    env: HashMap<String, String>,
}

impl StdioBuilder {
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> McpTransport {
        self.into()
    }
}

impl From<StdioBuilder> for McpTransport {
    fn from(builder: StdioBuilder) -> Self {
        McpTransport::Stdio {
            command: builder.command,
            args: builder.args,
            env: builder.env,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpBuilder {
    url: String,
    headers: HashMap<String, String>,
}

impl HttpBuilder {
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> McpTransport {
        self.into()
    }
}

impl From<HttpBuilder> for McpTransport {
    fn from(builder: HttpBuilder) -> Self {
        McpTransport::Http {
            url: builder.url,
            headers: builder.headers,
        }
    }
}
