use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_lambda::error::DisplayErrorContext;
use lambda_clean_core::model::{GroupMember, MemberKind};
use lambda_clean_core::provider::Page;
use lambda_clean_core::{FunctionName, ProviderError, ResourceProvider, VersionId};

pub const FUNCTION_RESOURCE_TYPE: &str = "AWS::Lambda::Function";
pub const STACK_RESOURCE_TYPE: &str = "AWS::CloudFormation::Stack";

/// Lambda functions as the swept resources, CloudFormation stacks as groups.
#[derive(Debug, Clone)]
pub struct AwsResourceProvider {
    lambda: aws_sdk_lambda::Client,
    cloudformation: aws_sdk_cloudformation::Client,
}

impl AwsResourceProvider {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            lambda: aws_sdk_lambda::Client::new(config),
            cloudformation: aws_sdk_cloudformation::Client::new(config),
        }
    }
}

pub fn member_kind(resource_type: &str) -> MemberKind {
    match resource_type {
        FUNCTION_RESOURCE_TYPE => MemberKind::Function,
        STACK_RESOURCE_TYPE => MemberKind::Group,
        other => MemberKind::Other(other.to_string()),
    }
}

fn sdk_error(error: impl std::error::Error) -> ProviderError {
    ProviderError::new(DisplayErrorContext(error).to_string())
}

// SDK accessors return `&str` for required members and `Option<&str>` for
// optional ones; this accepts both.
fn optional_str<'a>(value: impl Into<Option<&'a str>>) -> Option<&'a str> {
    value.into()
}

#[async_trait]
impl ResourceProvider for AwsResourceProvider {
    async fn list_functions(
        &self,
        cursor: Option<&str>,
    ) -> Result<Page<FunctionName>, ProviderError> {
        let output = self
            .lambda
            .list_functions()
            .set_marker(cursor.map(str::to_string))
            .send()
            .await
            .map_err(sdk_error)?;

        Ok(Page {
            items: output
                .functions()
                .iter()
                .filter_map(|function| function.function_name())
                .map(FunctionName::new)
                .collect(),
            next_cursor: output.next_marker().map(str::to_string),
        })
    }

    async fn list_group_members(
        &self,
        group: &str,
        cursor: Option<&str>,
    ) -> Result<Page<GroupMember>, ProviderError> {
        let output = self
            .cloudformation
            .list_stack_resources()
            .stack_name(group)
            .set_next_token(cursor.map(str::to_string))
            .send()
            .await
            .map_err(sdk_error)?;

        Ok(Page {
            items: output
                .stack_resource_summaries()
                .iter()
                .map(|summary| GroupMember {
                    kind: member_kind(optional_str(summary.resource_type()).unwrap_or_default()),
                    physical_id: summary.physical_resource_id().map(str::to_string),
                })
                .collect(),
            next_cursor: output.next_token().map(str::to_string),
        })
    }

    async fn list_versions(
        &self,
        function: &FunctionName,
        cursor: Option<&str>,
    ) -> Result<Page<String>, ProviderError> {
        let output = self
            .lambda
            .list_versions_by_function()
            .function_name(function.as_str())
            .set_marker(cursor.map(str::to_string))
            .send()
            .await
            .map_err(sdk_error)?;

        Ok(Page {
            items: output
                .versions()
                .iter()
                .filter_map(|configuration| configuration.version())
                .map(str::to_string)
                .collect(),
            next_cursor: output.next_marker().map(str::to_string),
        })
    }

    async fn delete_function_version(
        &self,
        function: &FunctionName,
        version: &VersionId,
    ) -> Result<(), ProviderError> {
        self.lambda
            .delete_function()
            .function_name(function.as_str())
            .qualifier(version.as_str())
            .send()
            .await
            .map(|_| ())
            .map_err(sdk_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_cloudformation_resource_types() {
        assert_eq!(member_kind("AWS::Lambda::Function"), MemberKind::Function);
        assert_eq!(member_kind("AWS::CloudFormation::Stack"), MemberKind::Group);
        assert_eq!(
            member_kind("AWS::Lambda::Version"),
            MemberKind::Other("AWS::Lambda::Version".to_string())
        );
    }

    #[test]
    fn optional_str_accepts_both_accessor_shapes() {
        assert_eq!(optional_str("AWS::Lambda::Function"), Some("AWS::Lambda::Function"));
        assert_eq!(optional_str(None::<&str>), None);
    }
}
