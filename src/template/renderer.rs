//! Template renderer module.
//!
//! Renders parsed template nodes with the given context.

use super::filters::{strip_html, truncate_chars};
use super::parser::Node;
use super::{Result, TemplateContext, TemplateError, Value};

/// Template renderer.
pub struct Renderer<'a> {
    context: &'a TemplateContext,
}

impl<'a> Renderer<'a> {
    /// Create a new renderer with the given context.
    pub fn new(context: &'a TemplateContext) -> Self {
        Self { context }
    }

    /// Render a list of nodes to a string.
    pub fn render(&self, nodes: &[Node]) -> Result<String> {
        let mut output = String::new();

        for node in nodes {
            output.push_str(&self.render_node(node)?);
        }

        Ok(output)
    }

    /// Render a single node.
    fn render_node(&self, node: &Node) -> Result<String> {
        match node {
            Node::Text(text) => Ok(text.clone()),
            Node::Variable(name) => Ok(self.lookup(name)),
            Node::Truncate { variable, limit } => {
                Ok(truncate_chars(&self.lookup(variable), *limit))
            }
            Node::PlainText { variable } => Ok(strip_html(&self.lookup(variable))),
            Node::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.is_truthy(condition) {
                    self.render(then_branch)
                } else {
                    self.render(else_branch)
                }
            }
            Node::Each {
                variable,
                item_name,
                body,
            } => self.render_each(variable, item_name.as_deref(), body),
            Node::Unless { condition, body } => {
                if self.is_truthy(condition) {
                    Ok(String::new())
                } else {
                    self.render(body)
                }
            }
            Node::With { variable, body } => self.render_with(variable, body),
        }
    }

    /// Resolve a variable to display text. Missing variables render empty,
    /// as in Handlebars.
    fn lookup(&self, name: &str) -> String {
        self.context
            .get(name)
            .map(Value::to_display_string)
            .unwrap_or_default()
    }

    fn is_truthy(&self, name: &str) -> bool {
        self.context.get(name).is_some_and(Value::is_truthy)
    }

    /// Render an each block.
    fn render_each(
        &self,
        variable: &str,
        item_name: Option<&str>,
        body: &[Node],
    ) -> Result<String> {
        let list = match self.context.get(variable) {
            Some(Value::List(items)) => items,
            Some(Value::Null) | None => return Ok(String::new()),
            Some(_) => {
                return Err(TemplateError::Render(format!("'{variable}' is not a list")));
            }
        };

        let mut output = String::new();
        let item_var_name = item_name.unwrap_or("this");

        for (index, item) in list.iter().enumerate() {
            // Create a child context with loop variables
            let mut child_context = self.context.child();
            child_context.set(item_var_name, item.clone());
            child_context.set("@index", Value::Number(index as i64));
            child_context.set("@first", Value::Bool(index == 0));
            child_context.set("@last", Value::Bool(index == list.len() - 1));

            // If item is an object, also expose its fields directly
            if let Value::Object(obj) = item {
                for (key, value) in obj {
                    child_context.set(key.clone(), value.clone());
                }
            }

            output.push_str(&Renderer::new(&child_context).render(body)?);
        }

        Ok(output)
    }

    /// Render a with block.
    fn render_with(&self, variable: &str, body: &[Node]) -> Result<String> {
        let value = match self.context.get(variable) {
            Some(v) => v.clone(),
            None => return Ok(String::new()),
        };

        let mut child_context = self.context.child();

        // If value is an object, expose its fields directly
        if let Value::Object(obj) = &value {
            for (key, val) in obj {
                child_context.set(key.clone(), val.clone());
            }
        }

        // Also expose the value as "this"
        child_context.set("this", value);

        Renderer::new(&child_context).render(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn item_context() -> TemplateContext {
        let mut item = HashMap::new();
        item.insert("title".to_string(), Value::from("Release notes"));
        item.insert("link".to_string(), Value::from("https://example.com/r"));
        item.insert(
            "description".to_string(),
            Value::from("<p>New <b>features</b> &amp; fixes</p>"),
        );
        item.insert("author".to_string(), Value::from(""));
        item.insert("categories".to_string(), Value::from(vec!["rust", "cli"]));

        let mut feed = HashMap::new();
        feed.insert("title".to_string(), Value::from("Project Blog"));

        let mut context = TemplateContext::new();
        context.set("item", Value::Object(item));
        context.set("feed", Value::Object(feed));
        context
    }

    fn render(context: &TemplateContext, nodes: Vec<Node>) -> String {
        Renderer::new(context).render(&nodes).unwrap()
    }

    #[test]
    fn test_render_text_and_variables() {
        let context = item_context();
        let result = render(
            &context,
            vec![
                Node::Variable("item.title".to_string()),
                Node::Text("\n".to_string()),
                Node::Variable("item.link".to_string()),
            ],
        );

        assert_eq!(result, "Release notes\nhttps://example.com/r");
    }

    #[test]
    fn test_render_variable_missing() {
        let context = item_context();
        let result = render(&context, vec![Node::Variable("item.missing".to_string())]);
        assert_eq!(result, "");
    }

    #[test]
    fn test_render_list_variable_joins() {
        let context = item_context();
        let result = render(&context, vec![Node::Variable("item.categories".to_string())]);
        assert_eq!(result, "rust, cli");
    }

    #[test]
    fn test_render_truncate() {
        let context = item_context();
        let result = render(
            &context,
            vec![Node::Truncate {
                variable: "item.title".to_string(),
                limit: 10,
            }],
        );
        assert_eq!(result, "Release...");
    }

    #[test]
    fn test_render_plain_text() {
        let context = item_context();
        let result = render(
            &context,
            vec![Node::PlainText {
                variable: "item.description".to_string(),
            }],
        );
        assert_eq!(result, "New features & fixes");
    }

    #[test]
    fn test_render_if_else() {
        let context = item_context();
        let nodes = |condition: &str| {
            vec![Node::If {
                condition: condition.to_string(),
                then_branch: vec![Node::Text("yes".to_string())],
                else_branch: vec![Node::Text("no".to_string())],
            }]
        };

        assert_eq!(render(&context, nodes("item.title")), "yes");
        // Empty string and missing variable are both falsy
        assert_eq!(render(&context, nodes("item.author")), "no");
        assert_eq!(render(&context, nodes("item.nothing")), "no");
    }

    #[test]
    fn test_render_unless() {
        let context = item_context();
        let result = render(
            &context,
            vec![Node::Unless {
                condition: "item.author".to_string(),
                body: vec![Node::Text("anonymous".to_string())],
            }],
        );
        assert_eq!(result, "anonymous");
    }

    #[test]
    fn test_render_each_with_name() {
        let context = item_context();
        let result = render(
            &context,
            vec![Node::Each {
                variable: "item.categories".to_string(),
                item_name: Some("tag".to_string()),
                body: vec![
                    Node::Text("#".to_string()),
                    Node::Variable("tag".to_string()),
                    Node::Unless {
                        condition: "@last".to_string(),
                        body: vec![Node::Text(" ".to_string())],
                    },
                ],
            }],
        );
        assert_eq!(result, "#rust #cli");
    }

    #[test]
    fn test_render_each_index_and_this() {
        let context = item_context();
        let result = render(
            &context,
            vec![Node::Each {
                variable: "item.categories".to_string(),
                item_name: None,
                body: vec![
                    Node::Variable("@index".to_string()),
                    Node::Text("=".to_string()),
                    Node::Variable("this".to_string()),
                    Node::Text(";".to_string()),
                ],
            }],
        );
        assert_eq!(result, "0=rust;1=cli;");
    }

    #[test]
    fn test_render_each_missing_or_null() {
        let mut context = item_context();
        context.set("nothing", Value::Null);

        for variable in ["missing", "nothing"] {
            let result = render(
                &context,
                vec![Node::Each {
                    variable: variable.to_string(),
                    item_name: None,
                    body: vec![Node::Text("x".to_string())],
                }],
            );
            assert_eq!(result, "");
        }
    }

    #[test]
    fn test_render_each_not_a_list() {
        let context = item_context();
        let nodes = vec![Node::Each {
            variable: "item.title".to_string(),
            item_name: None,
            body: vec![],
        }];

        let result = Renderer::new(&context).render(&nodes);
        assert!(matches!(result, Err(TemplateError::Render(_))));
    }

    #[test]
    fn test_render_with() {
        let context = item_context();
        let result = render(
            &context,
            vec![Node::With {
                variable: "feed".to_string(),
                body: vec![
                    Node::Text("via ".to_string()),
                    Node::Variable("title".to_string()),
                ],
            }],
        );
        assert_eq!(result, "via Project Blog");
    }

    #[test]
    fn test_render_with_missing() {
        let context = item_context();
        let result = render(
            &context,
            vec![Node::With {
                variable: "missing".to_string(),
                body: vec![Node::Text("content".to_string())],
            }],
        );
        assert_eq!(result, "");
    }
}
