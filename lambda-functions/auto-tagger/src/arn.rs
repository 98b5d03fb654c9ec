//! ARN templates for services whose list APIs return bare resource IDs.

pub fn efs_file_system(region: &str, account_id: &str, file_system_id: &str) -> String {
    format!("arn:aws:elasticfilesystem:{region}:{account_id}:file-system/{file_system_id}")
}

pub fn athena_workgroup(region: &str, account_id: &str, name: &str) -> String {
    format!("arn:aws:athena:{region}:{account_id}:workgroup/{name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn efs_arn_template() {
        assert_eq!(
            efs_file_system("us-east-1", "123456789012", "fs-0abc"),
            "arn:aws:elasticfilesystem:us-east-1:123456789012:file-system/fs-0abc"
        );
    }

    #[test]
    fn athena_workgroup_arn_template() {
        assert_eq!(
            athena_workgroup("eu-west-1", "123456789012", "analytics"),
            "arn:aws:athena:eu-west-1:123456789012:workgroup/analytics"
        );
    }
}
